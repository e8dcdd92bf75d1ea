//! Recommendation service orchestrating candidate retrieval and ranking

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::providers::{DatasetPool, DownloadCounter};
use super::similarity::SimilarityCalculator;
use super::types::{Recommendation, ScoredCandidate, ScoringInput};
use super::DEFAULT_TOP_K;
use crate::domain::dataset::{Dataset, DatasetId};
use crate::errors::ApplicationError;

/// Scores every synchronized dataset against a target and keeps the top `k`.
#[derive(Clone)]
pub struct DatasetRecommenderService {
    dataset_pool: Arc<dyn DatasetPool>,
    download_counter: Arc<dyn DownloadCounter>,
    k: usize,
}

impl std::fmt::Debug for DatasetRecommenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetRecommenderService").field("k", &self.k).finish_non_exhaustive()
    }
}

impl DatasetRecommenderService {
    pub fn new(
        dataset_pool: Arc<dyn DatasetPool>,
        download_counter: Arc<dyn DownloadCounter>,
    ) -> Self {
        Self::with_k(dataset_pool, download_counter, DEFAULT_TOP_K)
    }

    pub fn with_k(
        dataset_pool: Arc<dyn DatasetPool>,
        download_counter: Arc<dyn DownloadCounter>,
        k: usize,
    ) -> Self {
        Self { dataset_pool, download_counter, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub async fn get_recommendations(
        &self,
        target: &Dataset,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        self.get_recommendations_at(target, Utc::now()).await
    }

    pub async fn get_recommendations_at(
        &self,
        target: &Dataset,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, ApplicationError> {
        let ranked = self.score_candidates_at(target, now).await?;
        Ok(ranked.into_iter().map(Recommendation::from).collect())
    }

    /// Same pass as [`Self::get_recommendations_at`] but keeps scores and
    /// sub-scores for each returned candidate.
    pub async fn score_candidates_at(
        &self,
        target: &Dataset,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredCandidate>, ApplicationError> {
        let dataset_id = target.id.map(|id| id.0);
        debug!(
            event_name = "recommender.pass.start",
            dataset_id = ?dataset_id,
            k = self.k,
            "scoring recommendation candidates"
        );

        let candidates = self.dataset_pool.get_all_synchronized_datasets().await?;
        let max_downloads = self.download_counter.total_dataset_downloads().await?;

        let candidate_ids: Vec<DatasetId> = candidates
            .iter()
            .filter_map(|candidate| candidate.id)
            .filter(|id| target.id != Some(*id))
            .collect();
        let downloads = self.download_counter.count_downloads_for_datasets(&candidate_ids).await?;

        let ranked = rank(target, &candidates, max_downloads, &downloads, now, self.k);

        info!(
            event_name = "recommender.pass.completed",
            dataset_id = ?dataset_id,
            candidate_count = candidate_ids.len(),
            max_downloads,
            returned = ranked.len(),
            "recommendations calculated"
        );

        Ok(ranked)
    }
}

/// Scores `candidates` against `target`, orders them by score descending
/// with ties kept in pool order, and keeps the first `k`.
///
/// The target itself and candidates without an id are skipped. Missing
/// entries in `downloads` count as zero downloads.
pub fn rank(
    target: &Dataset,
    candidates: &[Dataset],
    max_downloads: u64,
    downloads: &HashMap<DatasetId, u64>,
    now: DateTime<Utc>,
    k: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .enumerate()
        .filter_map(|(pool_index, candidate)| {
            let id = candidate.id?;
            if target.id == Some(id) {
                return None;
            }

            let input = ScoringInput {
                dataset: candidate,
                downloads_count: downloads.get(&id).copied().unwrap_or(0),
            };
            let breakdown =
                SimilarityCalculator::score_breakdown_at(target, &input, max_downloads, now);

            Some(ScoredCandidate {
                id,
                title: candidate.title(),
                score: breakdown.weighted_total(),
                breakdown,
                pool_index,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.pool_index.cmp(&b.pool_index)));
    scored.truncate(k);
    scored
}
