use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use dsreco_core::domain::dataset::{Author, AuthorId, DatasetId, DatasetMetadata};

use crate::connection::DbPool;
use crate::repositories::{
    DatasetRepository, DownloadRecordRepository, RepositoryError, SqlDatasetRepository,
    SqlDownloadRecordRepository,
};

struct SeedAuthor {
    id: i64,
    name: &'static str,
    affiliation: Option<&'static str>,
}

struct SeedDatasetContract {
    title: &'static str,
    description: &'static str,
    tags: Option<&'static str>,
    dataset_doi: Option<&'static str>,
    author_ids: &'static [i64],
    age_days: i64,
    downloads: u32,
}

const SEED_AUTHORS: &[SeedAuthor] = &[
    SeedAuthor { id: 10, name: "Lucía Ortega", affiliation: Some("University of Seville") },
    SeedAuthor { id: 11, name: "Marco Ruiz", affiliation: Some("University of Seville") },
    SeedAuthor { id: 20, name: "Ana Beltrán", affiliation: None },
    SeedAuthor { id: 30, name: "Jonas Weber", affiliation: Some("TU Berlin") },
];

/// Demo catalogue. For the first (web/js/api) dataset the expected ranking
/// is A, C, then the automotive set, with B last.
const SEED_DATASETS: &[SeedDatasetContract] = &[
    SeedDatasetContract {
        title: "Web API feature models",
        description: "Target dataset for the reference ranking scenario",
        tags: Some("web,js,api"),
        dataset_doi: Some("10.1234/dsreco.target"),
        author_ids: &[10],
        age_days: 3,
        downloads: 0,
    },
    SeedDatasetContract {
        title: "HTTP service variability",
        description: "Candidate A: strong tag and author overlap, popular, recent",
        tags: Some("web,api,http"),
        dataset_doi: Some("10.1234/dsreco.a"),
        author_ids: &[10, 11],
        age_days: 5,
        downloads: 90,
    },
    SeedDatasetContract {
        title: "Legacy product manuals",
        description: "Candidate B: unrelated, rarely downloaded, old",
        tags: Some("manual"),
        dataset_doi: Some("10.1234/dsreco.b"),
        author_ids: &[20],
        age_days: 900,
        downloads: 10,
    },
    SeedDatasetContract {
        title: "Stylesheet configurations",
        description: "Candidate C: shared author only, fairly popular, recent",
        tags: Some("ux,css"),
        dataset_doi: Some("10.1234/dsreco.c"),
        author_ids: &[10],
        age_days: 5,
        downloads: 50,
    },
    SeedDatasetContract {
        title: "Automotive product lines",
        description: "Published dataset with whitespace-separated tags",
        tags: Some("automotive, embedded"),
        dataset_doi: Some("10.1234/dsreco.d"),
        author_ids: &[30],
        age_days: 400,
        downloads: 20,
    },
    SeedDatasetContract {
        title: "Unpublished draft",
        description: "Not synchronized: never part of the candidate pool",
        tags: Some("web,js,api"),
        dataset_doi: None,
        author_ids: &[10],
        age_days: 1,
        downloads: 0,
    },
];

/// Deterministic demo catalogue for local runs and end-to-end checks.
pub struct DemoCatalog;

impl DemoCatalog {
    /// Inserts the demo datasets, authors and download records. Creation
    /// dates are relative to `now`.
    pub async fn load(pool: &DbPool, now: DateTime<Utc>) -> Result<SeedResult, RepositoryError> {
        let datasets = SqlDatasetRepository::new(pool.clone());
        let downloads = SqlDownloadRecordRepository::new(pool.clone());

        let mut seeded = Vec::with_capacity(SEED_DATASETS.len());
        let mut download_records = 0u64;

        for contract in SEED_DATASETS {
            let id = datasets
                .insert(now - Duration::days(contract.age_days), Some(seed_metadata(contract)))
                .await?;

            for n in 0..contract.downloads {
                downloads.record_download(&id, &format!("seed-{}-{n}", id.0), now).await?;
            }
            download_records += u64::from(contract.downloads);

            seeded.push(SeededDataset {
                id,
                title: contract.title,
                synchronized: contract.dataset_doi.is_some(),
            });
        }

        tracing::info!(
            event_name = "db.fixtures.loaded",
            datasets = seeded.len(),
            download_records,
            "demo catalogue loaded"
        );

        Ok(SeedResult { datasets: seeded, download_records })
    }

    /// Removes every dataset, author and download record.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        let tables =
            ["ds_download_record", "ds_meta_data_author", "dataset", "author", "ds_meta_data"];
        for table in tables {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }
        // Restart AUTOINCREMENT ids so a reload yields the same dataset ids.
        sqlx::query(
            "DELETE FROM sqlite_sequence
             WHERE name IN ('ds_download_record', 'dataset', 'ds_meta_data')",
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn seed_metadata(contract: &SeedDatasetContract) -> DatasetMetadata {
    DatasetMetadata {
        title: contract.title.to_string(),
        description: contract.description.to_string(),
        tags: contract.tags.map(str::to_string),
        dataset_doi: contract.dataset_doi.map(str::to_string),
        authors: contract
            .author_ids
            .iter()
            .filter_map(|id| SEED_AUTHORS.iter().find(|author| author.id == *id))
            .map(|author| Author {
                id: AuthorId(author.id),
                name: author.name.to_string(),
                affiliation: author.affiliation.map(str::to_string),
                orcid: None,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeededDataset {
    pub id: DatasetId,
    pub title: &'static str,
    pub synchronized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub datasets: Vec<SeededDataset>,
    pub download_records: u64,
}
