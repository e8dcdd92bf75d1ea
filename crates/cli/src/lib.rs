pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use dsreco_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "dsreco",
    about = "Dataset recommendation CLI",
    long_about = "Rank related datasets, manage the recommendation database, and inspect configuration.",
    after_help = "Examples:\n  dsreco migrate\n  dsreco seed\n  dsreco recommend --dataset-id 1 --k 3 --explain"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace the catalogue with the deterministic demo datasets")]
    Seed,
    #[command(about = "Print the top related datasets for a dataset as JSON")]
    Recommend {
        #[arg(long, help = "Id of the dataset to find related datasets for")]
        dataset_id: i64,
        #[arg(long, help = "Maximum number of recommendations (defaults to recommender.top_k)")]
        k: Option<usize>,
        #[arg(long, help = "Include per-candidate scores and sub-scores")]
        explain: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Recommend { dataset_id, k, explain } => {
            commands::recommend::run(RecommendArgs { dataset_id, k, explain })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays machine-readable. An invalid config
/// leaves logging off; the command itself reports the config error.
fn init_logging() {
    let Ok(config) = AppConfig::load(LoadOptions::default()) else {
        return;
    };

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
