use chrono::Utc;

use crate::commands::{open_database, prepare, CommandFailure, CommandResult};
use dsreco_core::config::LoadOptions;
use dsreco_db::fixtures::SeededDataset;
use dsreco_db::DemoCatalog;

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed", LoadOptions::default()) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        // Reseeding replaces the catalogue so ids stay deterministic.
        DemoCatalog::clean(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let seeded = DemoCatalog::load(&pool, Utc::now())
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        pool.close().await;
        Ok::<_, CommandFailure>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            seed_summary(&seeded.datasets, seeded.download_records),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_summary(datasets: &[SeededDataset], download_records: u64) -> String {
    let lines: Vec<String> = datasets
        .iter()
        .map(|dataset| {
            let state = if dataset.synchronized { "synchronized" } else { "unsynchronized" };
            format!("  - #{}: {} ({state})", dataset.id, dataset.title)
        })
        .collect();
    format!(
        "demo catalogue loaded with {} datasets and {download_records} download records:\n{}",
        datasets.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use dsreco_core::domain::dataset::DatasetId;
    use dsreco_db::fixtures::SeededDataset;

    use super::seed_summary;

    #[test]
    fn summary_lists_each_dataset_with_sync_state() {
        let datasets = [
            SeededDataset { id: DatasetId(1), title: "Alpha", synchronized: true },
            SeededDataset { id: DatasetId(2), title: "Draft", synchronized: false },
        ];

        assert_eq!(
            seed_summary(&datasets, 12),
            "demo catalogue loaded with 2 datasets and 12 download records:\n  \
             - #1: Alpha (synchronized)\n  - #2: Draft (unsynchronized)"
        );
    }
}
