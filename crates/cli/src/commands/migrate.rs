use crate::commands::{open_database, prepare, CommandResult};
use dsreco_core::config::LoadOptions;

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate", LoadOptions::default()) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok::<(), super::CommandFailure>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
