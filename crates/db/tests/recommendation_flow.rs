use std::sync::Arc;

use chrono::{Duration, Utc};

use dsreco_core::domain::dataset::{Author, AuthorId, DatasetId, DatasetMetadata};
use dsreco_core::recommender::{DatasetPool, DatasetRecommenderService, DownloadCounter};
use dsreco_db::repositories::{
    DatasetRepository, DownloadRecordRepository, SqlDatasetRepository,
    SqlDownloadRecordRepository,
};
use dsreco_db::{connect_with_settings, migrations, DbPool};

async fn migrated_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

fn metadata(title: &str, tags: &str, doi: Option<&str>, authors: &[i64]) -> DatasetMetadata {
    DatasetMetadata {
        title: title.to_string(),
        description: format!("{title} description"),
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
async fn identical_candidates_keep_pool_order_through_sql() {
    let pool = migrated_pool().await;
    let datasets = Arc::new(SqlDatasetRepository::new(pool.clone()));
    let downloads = Arc::new(SqlDownloadRecordRepository::new(pool));
    let now = Utc::now();

    let target = datasets
        .insert(now, Some(metadata("Target", "a,b", Some("10.1/t"), &[1])))
        .await
        .expect("target");
    let mut twins = Vec::new();
    for n in 0..4 {
        let doi = format!("10.1/twin-{n}");
        let id = datasets
            .insert(now - Duration::days(10), Some(metadata("Twin", "a", Some(&doi), &[2])))
            .await
            .expect("twin");
        twins.push(id);
    }

    let service = DatasetRecommenderService::with_k(datasets.clone(), downloads, 3);
    let target = datasets.find_by_id(&target).await.expect("find").expect("target");
    let recommendations = service.get_recommendations_at(&target, now).await.expect("rank");

    let ids: Vec<DatasetId> = recommendations.iter().map(|rec| rec.id).collect();
    assert_eq!(ids, twins[..3].to_vec());
}

#[tokio::test]
async fn unsynchronized_and_blank_doi_datasets_are_never_recommended() {
    let pool = migrated_pool().await;
    let datasets = Arc::new(SqlDatasetRepository::new(pool.clone()));
    let downloads = Arc::new(SqlDownloadRecordRepository::new(pool));
    let now = Utc::now();

    let target = datasets
        .insert(now, Some(metadata("Target", "a", Some("10.1/t"), &[1])))
        .await
        .expect("target");
    let published = datasets
        .insert(now, Some(metadata("Published", "z", Some("10.1/p"), &[9])))
        .await
        .expect("published");
    let draft = datasets
        .insert(now, Some(metadata("Draft", "a", None, &[1])))
        .await
        .expect("draft");
    datasets.insert(now, Some(metadata("Blank", "a", Some("  "), &[1]))).await.expect("blank");
    datasets.insert(now, None).await.expect("bare");

    for n in 0..5 {
        downloads.record_download(&draft, &format!("cookie-{n}"), now).await.expect("record");
    }

    let pool_ids: Vec<Option<DatasetId>> = datasets
        .get_all_synchronized_datasets()
        .await
        .expect("pool")
        .iter()
        .map(|dataset| dataset.id)
        .collect();
    assert_eq!(pool_ids, vec![Some(target), Some(published)]);

    let service = DatasetRecommenderService::new(datasets.clone(), downloads);
    let target = datasets.find_by_id(&target).await.expect("find").expect("target");
    let recommendations = service.get_recommendations_at(&target, now).await.expect("rank");

    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].id, published);
    assert_eq!(recommendations[0].title, "Published");
}

const LARGE_CATALOGUE: i64 = 33_000;

/// Bulk-loads a catalogue larger than SQLite's bound-parameter limit. Every
/// thousandth dataset gets one download and all share one author.
async fn load_large_catalogue(pool: &DbPool) {
    let mut tx = pool.begin().await.expect("begin");
    let statements = [
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?1)
         INSERT INTO ds_meta_data (id, title, description, tags, dataset_doi)
         SELECT n, 'Dataset ' || n, '', 'bulk,shared', '10.1/bulk-' || n FROM seq",
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?1)
         INSERT INTO dataset (id, ds_meta_data_id, created_at)
         SELECT n, n, '2026-01-01T00:00:00+00:00' FROM seq",
        "INSERT INTO author (id, name) VALUES (1, 'Bulk Author')",
        "INSERT INTO ds_meta_data_author (ds_meta_data_id, author_id, position)
         SELECT id, 1, 0 FROM ds_meta_data",
        "INSERT INTO ds_download_record (dataset_id, download_date, download_cookie)
         SELECT id, '2026-02-01T00:00:00+00:00', 'bulk-' || id FROM dataset WHERE id % 1000 = 0",
    ];
    for statement in statements {
        let mut query = sqlx::query(statement);
        if statement.contains("?1") {
            query = query.bind(LARGE_CATALOGUE);
        }
        query.execute(&mut *tx).await.expect("bulk load");
    }
    tx.commit().await.expect("commit");
}

#[tokio::test]
async fn catalogue_beyond_sqlite_parameter_limit_is_ranked() {
    let pool = migrated_pool().await;
    load_large_catalogue(&pool).await;
    let datasets = Arc::new(SqlDatasetRepository::new(pool.clone()));
    let downloads = Arc::new(SqlDownloadRecordRepository::new(pool));

    let synchronized = datasets.get_all_synchronized_datasets().await.expect("pool");
    assert_eq!(synchronized.len(), LARGE_CATALOGUE as usize);
    let last = synchronized.last().expect("last dataset");
    assert_eq!(last.author_ids().len(), 1, "authors hydrated past the first chunk");

    let ids: Vec<DatasetId> = synchronized.iter().filter_map(|dataset| dataset.id).collect();
    let batched = downloads.count_downloads_for_datasets(&ids).await.expect("batched counts");
    assert_eq!(batched.len(), ids.len());
    assert_eq!(batched.values().sum::<u64>(), 33);
    for id in [DatasetId(999), DatasetId(1000), DatasetId(32_000), DatasetId(33_000)] {
        let single = downloads.count_downloads_for_dataset(&id).await.expect("single");
        assert_eq!(batched.get(&id).copied(), Some(single), "mismatch for {id}");
    }

    let service = DatasetRecommenderService::new(datasets.clone(), downloads);
    let target = datasets.find_by_id(&DatasetId(1)).await.expect("find").expect("target");
    let recommendations = service.get_recommendations(&target).await.expect("rank");

    let ids: Vec<i64> = recommendations.iter().map(|rec| rec.id.0).collect();
    assert_eq!(ids, vec![1000, 2000, 3000, 4000, 5000]);
}
