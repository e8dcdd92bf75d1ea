use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use dsreco_core::domain::dataset::{Dataset, DatasetId, DatasetMetadata};
use dsreco_core::errors::ApplicationError;

pub mod dataset;
pub mod download;
pub mod memory;

pub use dataset::SqlDatasetRepository;
pub use download::SqlDownloadRecordRepository;
pub use memory::{InMemoryDatasetRepository, InMemoryDownloadRepository};

/// Ids bound per `IN (...)` query. SQLite rejects statements with more than
/// 32766 bound parameters.
pub(crate) const BIND_CHUNK_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    async fn find_by_id(&self, id: &DatasetId) -> Result<Option<Dataset>, RepositoryError>;

    /// Stores a new dataset and returns its assigned id.
    async fn insert(
        &self,
        created_at: DateTime<Utc>,
        metadata: Option<DatasetMetadata>,
    ) -> Result<DatasetId, RepositoryError>;
}

#[async_trait]
pub trait DownloadRecordRepository: Send + Sync {
    async fn record_download(
        &self,
        dataset_id: &DatasetId,
        download_cookie: &str,
        download_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
