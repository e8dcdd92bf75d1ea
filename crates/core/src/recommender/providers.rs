//! Collaborator contracts consumed by the recommender

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::dataset::{Dataset, DatasetId};
use crate::errors::ApplicationError;

/// Source of the candidate pool.
#[async_trait]
pub trait DatasetPool: Send + Sync {
    /// All datasets eligible for recommendation (published ones).
    async fn get_all_synchronized_datasets(&self) -> Result<Vec<Dataset>, ApplicationError>;
}

/// Source of download statistics.
#[async_trait]
pub trait DownloadCounter: Send + Sync {
    /// Total downloads across every dataset. Used as the global
    /// normalization denominator for the downloads sub-score.
    async fn total_dataset_downloads(&self) -> Result<u64, ApplicationError>;

    async fn count_downloads_for_dataset(&self, id: &DatasetId) -> Result<u64, ApplicationError>;

    /// Per-dataset counts for many ids at once. Implementations backed by a
    /// database should override this with a single query; the result must
    /// match calling [`Self::count_downloads_for_dataset`] for each id.
    async fn count_downloads_for_datasets(
        &self,
        ids: &[DatasetId],
    ) -> Result<HashMap<DatasetId, u64>, ApplicationError> {
        let mut counts = HashMap::with_capacity(ids.len());
        for id in ids {
            let count = self.count_downloads_for_dataset(id).await?;
            counts.insert(*id, count);
        }
        Ok(counts)
    }
}
