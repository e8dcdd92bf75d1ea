use std::process::ExitCode;

fn main() -> ExitCode {
    dsreco_cli::run()
}
