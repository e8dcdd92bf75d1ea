use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;

use dsreco_core::domain::dataset::{Author, AuthorId, Dataset, DatasetId, DatasetMetadata};
use dsreco_core::errors::ApplicationError;
use dsreco_core::recommender::DatasetPool;

use super::{DatasetRepository, RepositoryError, BIND_CHUNK_SIZE};
use crate::DbPool;

const DATASET_SELECT: &str = "SELECT d.id, d.created_at, m.id AS meta_id, m.title, m.description,
        m.tags, m.dataset_doi
     FROM dataset d
     LEFT JOIN ds_meta_data m ON m.id = d.ds_meta_data_id";

pub struct SqlDatasetRepository {
    pool: DbPool,
}

impl SqlDatasetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn authors_by_metadata(
        &self,
        meta_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Author>>, RepositoryError> {
        let mut authors: HashMap<i64, Vec<Author>> = HashMap::new();
        if meta_ids.is_empty() {
            return Ok(authors);
        }

        for chunk in meta_ids.chunks(BIND_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT dma.ds_meta_data_id, a.id, a.name, a.affiliation, a.orcid
                 FROM ds_meta_data_author dma
                 JOIN author a ON a.id = dma.author_id
                 WHERE dma.ds_meta_data_id IN ({placeholders})
                 ORDER BY dma.ds_meta_data_id, dma.position, a.id"
            );

            let mut query = sqlx::query(&sql);
            for meta_id in chunk {
                query = query.bind(*meta_id);
            }

            for row in query.fetch_all(&self.pool).await? {
                let meta_id: i64 = row
                    .try_get("ds_meta_data_id")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let author = Author {
                    id: AuthorId(
                        row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    ),
                    name: row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    affiliation: row
                        .try_get("affiliation")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    orcid: row
                        .try_get("orcid")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                };
                authors.entry(meta_id).or_default().push(author);
            }
        }

        Ok(authors)
    }

    async fn hydrate(
        &self,
        rows: Vec<sqlx::sqlite::SqliteRow>,
    ) -> Result<Vec<Dataset>, RepositoryError> {
        let meta_ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get::<Option<i64>, _>("meta_id"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            .into_iter()
            .flatten()
            .collect();
        let mut authors = self.authors_by_metadata(&meta_ids).await?;

        rows.iter().map(|row| row_to_dataset(row, &mut authors)).collect()
    }

    /// Every stored dataset, synchronized or not, in id order.
    pub async fn list_all(&self) -> Result<Vec<Dataset>, RepositoryError> {
        let rows = sqlx::query(&format!("{DATASET_SELECT} ORDER BY d.id ASC"))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    pub async fn list_synchronized(&self) -> Result<Vec<Dataset>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{DATASET_SELECT}
             WHERE m.dataset_doi IS NOT NULL AND TRIM(m.dataset_doi) <> ''
             ORDER BY d.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }
}

fn row_to_dataset(
    row: &sqlx::sqlite::SqliteRow,
    authors: &mut HashMap<i64, Vec<Author>>,
) -> Result<Dataset, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let meta_id: Option<i64> =
        row.try_get("meta_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let metadata = match meta_id {
        Some(meta_id) => Some(DatasetMetadata {
            title: row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            description: row
                .try_get("description")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            tags: row.try_get("tags").map_err(|e| RepositoryError::Decode(e.to_string()))?,
            dataset_doi: row
                .try_get("dataset_doi")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            authors: authors.remove(&meta_id).unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Dataset {
        id: Some(DatasetId(id)),
        created_at: parse_timestamp(&created_at_str)?,
        metadata,
    })
}

/// RFC 3339 timestamps keep their offset. Naive timestamps are taken as UTC.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RepositoryError::Decode(format!("invalid timestamp `{value}`")))
}

#[async_trait::async_trait]
impl DatasetRepository for SqlDatasetRepository {
    async fn find_by_id(&self, id: &DatasetId) -> Result<Option<Dataset>, RepositoryError> {
        let rows = sqlx::query(&format!("{DATASET_SELECT} WHERE d.id = ?"))
            .bind(id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn insert(
        &self,
        created_at: DateTime<Utc>,
        metadata: Option<DatasetMetadata>,
    ) -> Result<DatasetId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let meta_id = match &metadata {
            Some(meta) => {
                let meta_id = sqlx::query(
                    "INSERT INTO ds_meta_data (title, description, tags, dataset_doi)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(&meta.title)
                .bind(&meta.description)
                .bind(&meta.tags)
                .bind(&meta.dataset_doi)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

                for (position, author) in meta.authors.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO author (id, name, affiliation, orcid)
                         VALUES (?, ?, ?, ?)
                         ON CONFLICT(id) DO UPDATE SET
                             name = excluded.name,
                             affiliation = excluded.affiliation,
                             orcid = excluded.orcid",
                    )
                    .bind(author.id.0)
                    .bind(&author.name)
                    .bind(&author.affiliation)
                    .bind(&author.orcid)
                    .execute(&mut *tx)
                    .await?;

                    sqlx::query(
                        "INSERT INTO ds_meta_data_author (ds_meta_data_id, author_id, position)
                         VALUES (?, ?, ?)
                         ON CONFLICT(ds_meta_data_id, author_id) DO NOTHING",
                    )
                    .bind(meta_id)
                    .bind(author.id.0)
                    .bind(position as i64)
                    .execute(&mut *tx)
                    .await?;
                }

                Some(meta_id)
            }
            None => None,
        };

        let dataset_id =
            sqlx::query("INSERT INTO dataset (ds_meta_data_id, created_at) VALUES (?, ?)")
                .bind(meta_id)
                .bind(created_at.to_rfc3339())
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

        tx.commit().await?;
        Ok(DatasetId(dataset_id))
    }
}

#[async_trait::async_trait]
impl DatasetPool for SqlDatasetRepository {
    async fn get_all_synchronized_datasets(&self) -> Result<Vec<Dataset>, ApplicationError> {
        Ok(self.list_synchronized().await?)
    }
}
