use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dsreco_core::domain::dataset::{Dataset, DatasetId, DatasetMetadata};
use dsreco_core::errors::ApplicationError;
use dsreco_core::recommender::{DatasetPool, DownloadCounter};

use super::{DatasetRepository, DownloadRecordRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryDatasetRepository {
    datasets: RwLock<Vec<Dataset>>,
}

#[async_trait::async_trait]
impl DatasetRepository for InMemoryDatasetRepository {
    async fn find_by_id(&self, id: &DatasetId) -> Result<Option<Dataset>, RepositoryError> {
        let datasets = self.datasets.read().await;
        Ok(datasets.iter().find(|dataset| dataset.id == Some(*id)).cloned())
    }

    async fn insert(
        &self,
        created_at: DateTime<Utc>,
        metadata: Option<DatasetMetadata>,
    ) -> Result<DatasetId, RepositoryError> {
        let mut datasets = self.datasets.write().await;
        let next =
            datasets.iter().filter_map(|dataset| dataset.id).map(|id| id.0).max().unwrap_or(0);
        let id = DatasetId(next + 1);
        datasets.push(Dataset { id: Some(id), created_at, metadata });
        Ok(id)
    }
}

#[async_trait::async_trait]
impl DatasetPool for InMemoryDatasetRepository {
    async fn get_all_synchronized_datasets(&self) -> Result<Vec<Dataset>, ApplicationError> {
        let datasets = self.datasets.read().await;
        Ok(datasets.iter().filter(|dataset| dataset.is_synchronized()).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryDownloadRepository {
    downloads: RwLock<HashMap<DatasetId, u64>>,
}

#[async_trait::async_trait]
impl DownloadRecordRepository for InMemoryDownloadRepository {
    async fn record_download(
        &self,
        dataset_id: &DatasetId,
        _download_cookie: &str,
        _download_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut downloads = self.downloads.write().await;
        *downloads.entry(*dataset_id).or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DownloadCounter for InMemoryDownloadRepository {
    async fn total_dataset_downloads(&self) -> Result<u64, ApplicationError> {
        let downloads = self.downloads.read().await;
        Ok(downloads.values().sum())
    }

    async fn count_downloads_for_dataset(&self, id: &DatasetId) -> Result<u64, ApplicationError> {
        let downloads = self.downloads.read().await;
        Ok(downloads.get(id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use dsreco_core::domain::dataset::{Author, AuthorId, DatasetId, DatasetMetadata};
    use dsreco_core::recommender::{DatasetPool, DatasetRecommenderService, DownloadCounter};

    use crate::repositories::{
        DatasetRepository, DownloadRecordRepository, InMemoryDatasetRepository,
        InMemoryDownloadRepository,
    };

    fn metadata(title: &str, tags: &str, doi: Option<&str>, authors: &[i64]) -> DatasetMetadata {
        DatasetMetadata {
            title: title.to_string(),
            description: String::new(),
            tags: Some(tags.to_string()),
            dataset_doi: doi.map(str::to_string),
            authors: authors
                .iter()
                .map(|id| Author {
                    id: AuthorId(*id),
                    name: format!("Author {id}"),
                    affiliation: None,
                    orcid: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn in_memory_dataset_repo_round_trip() {
        let repo = InMemoryDatasetRepository::default();
        let meta = metadata("A", "x,y", Some("10.1/a"), &[1]);

        let id = repo.insert(Utc::now(), Some(meta.clone())).await.expect("insert");
        let found = repo.find_by_id(&id).await.expect("find").expect("dataset");

        assert_eq!(id, DatasetId(1));
        assert_eq!(found.metadata, Some(meta));
        assert!(repo.find_by_id(&DatasetId(2)).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn in_memory_pool_filters_unsynchronized() {
        let repo = InMemoryDatasetRepository::default();
        repo.insert(Utc::now(), Some(metadata("A", "x", Some("10.1/a"), &[]))).await.expect("a");
        repo.insert(Utc::now(), Some(metadata("B", "x", None, &[]))).await.expect("b");
        repo.insert(Utc::now(), None).await.expect("c");

        let pool = repo.get_all_synchronized_datasets().await.expect("pool");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, Some(DatasetId(1)));
    }

    #[tokio::test]
    async fn in_memory_download_counts() {
        let repo = InMemoryDownloadRepository::default();
        repo.record_download(&DatasetId(1), "c1", Utc::now()).await.expect("record");
        repo.record_download(&DatasetId(1), "c2", Utc::now()).await.expect("record");
        repo.record_download(&DatasetId(2), "c3", Utc::now()).await.expect("record");

        assert_eq!(repo.total_dataset_downloads().await.expect("total"), 3);
        assert_eq!(repo.count_downloads_for_dataset(&DatasetId(1)).await.expect("count"), 2);
        assert_eq!(repo.count_downloads_for_dataset(&DatasetId(9)).await.expect("count"), 0);

        let batched = repo
            .count_downloads_for_datasets(&[DatasetId(1), DatasetId(9)])
            .await
            .expect("batched");
        assert_eq!(batched.get(&DatasetId(1)), Some(&2));
        assert_eq!(batched.get(&DatasetId(9)), Some(&0));
    }

    #[tokio::test]
    async fn recommender_runs_against_in_memory_collaborators() {
        let datasets = Arc::new(InMemoryDatasetRepository::default());
        let downloads = Arc::new(InMemoryDownloadRepository::default());
        let now = Utc::now();

        let target = datasets
            .insert(now, Some(metadata("Target", "web,js,api", Some("10.1/t"), &[10])))
            .await
            .expect("target");
        let a = datasets
            .insert(now, Some(metadata("A", "web,api,http", Some("10.1/a"), &[10, 11])))
            .await
            .expect("a");
        let b = datasets
            .insert(
                now - Duration::days(1000),
                Some(metadata("B", "manual", Some("10.1/b"), &[20])),
            )
            .await
            .expect("b");
        let c = datasets
            .insert(now, Some(metadata("C", "ux,css", Some("10.1/c"), &[10])))
            .await
            .expect("c");

        for (id, count) in [(a, 900), (b, 100), (c, 500)] {
            for n in 0..count {
                downloads.record_download(&id, &format!("cookie-{n}"), now).await.expect("record");
            }
        }

        let service = DatasetRecommenderService::new(datasets.clone(), downloads);
        let target = datasets.find_by_id(&target).await.expect("find").expect("target");
        let recommendations = service.get_recommendations_at(&target, now).await.expect("rank");

        let ids: Vec<DatasetId> = recommendations.iter().map(|rec| rec.id).collect();
        assert_eq!(ids, vec![a, c, b]);
        assert_eq!(recommendations[0].title, "A");
    }
}
