use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row;

use dsreco_core::domain::dataset::DatasetId;
use dsreco_core::errors::ApplicationError;
use dsreco_core::recommender::DownloadCounter;

use super::{DownloadRecordRepository, RepositoryError, BIND_CHUNK_SIZE};
use crate::DbPool;

pub struct SqlDownloadRecordRepository {
    pool: DbPool,
}

impl SqlDownloadRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn total(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ds_download_record")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn count_for(&self, dataset_id: &DatasetId) -> Result<u64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ds_download_record WHERE dataset_id = ?")
                .bind(dataset_id.0)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    /// Grouped counts, one query per chunk of ids. Ids without downloads
    /// map to zero.
    pub async fn count_for_many(
        &self,
        ids: &[DatasetId],
    ) -> Result<HashMap<DatasetId, u64>, RepositoryError> {
        let mut counts: HashMap<DatasetId, u64> = ids.iter().map(|id| (*id, 0)).collect();
        if ids.is_empty() {
            return Ok(counts);
        }

        for chunk in ids.chunks(BIND_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT dataset_id, COUNT(*) AS downloads
                 FROM ds_download_record
                 WHERE dataset_id IN ({placeholders})
                 GROUP BY dataset_id"
            );

            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(id.0);
            }

            for row in query.fetch_all(&self.pool).await? {
                let dataset_id: i64 = row
                    .try_get("dataset_id")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let downloads: i64 =
                    row.try_get("downloads").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                counts.insert(DatasetId(dataset_id), downloads.max(0) as u64);
            }
        }

        Ok(counts)
    }
}

#[async_trait::async_trait]
impl DownloadRecordRepository for SqlDownloadRecordRepository {
    async fn record_download(
        &self,
        dataset_id: &DatasetId,
        download_cookie: &str,
        download_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO ds_download_record (dataset_id, download_date, download_cookie)
             VALUES (?, ?, ?)",
        )
        .bind(dataset_id.0)
        .bind(download_date.to_rfc3339())
        .bind(download_cookie)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DownloadCounter for SqlDownloadRecordRepository {
    async fn total_dataset_downloads(&self) -> Result<u64, ApplicationError> {
        Ok(self.total().await?)
    }

    async fn count_downloads_for_dataset(&self, id: &DatasetId) -> Result<u64, ApplicationError> {
        Ok(self.count_for(id).await?)
    }

    async fn count_downloads_for_datasets(
        &self,
        ids: &[DatasetId],
    ) -> Result<HashMap<DatasetId, u64>, ApplicationError> {
        Ok(self.count_for_many(ids).await?)
    }
}
