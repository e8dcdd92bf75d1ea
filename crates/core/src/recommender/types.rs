//! Types for the recommendation engine

use serde::{Deserialize, Serialize};

use crate::domain::dataset::{Dataset, DatasetId};

/// Relative weight of each scoring signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub tags: f64,
    pub authors: f64,
    pub downloads: f64,
    pub recency: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.tags + self.authors + self.downloads + self.recency
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Immutable per-candidate scoring input, built fresh for every pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub dataset: &'a Dataset,
    pub downloads_count: u64,
}

/// Individual sub-scores, each in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub tags: f64,
    pub authors: f64,
    pub downloads: f64,
    pub recency: f64,
}

impl ScoreBreakdown {
    pub fn weighted_total(&self) -> f64 {
        let weights = super::DEFAULT_WEIGHTS;
        weights.tags * self.tags
            + weights.authors * self.authors
            + weights.downloads * self.downloads
            + weights.recency * self.recency
    }
}

/// A ranked candidate with its score. Used for diagnostics; callers of
/// the recommendation API only ever see [`Recommendation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub id: DatasetId,
    pub title: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Position of the candidate in the pool it was drawn from
    pub pool_index: usize,
}

/// One entry of a recommendation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: DatasetId,
    pub title: String,
}

impl From<ScoredCandidate> for Recommendation {
    fn from(value: ScoredCandidate) -> Self {
        Self { id: value.id, title: value.title }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Recommendation, ScoreBreakdown, ScoredCandidate, ScoringWeights};
    use crate::domain::dataset::DatasetId;

    #[test]
    fn recommendation_serializes_to_id_and_title_only() {
        let candidate = ScoredCandidate {
            id: DatasetId(7),
            title: "Genomes".to_string(),
            score: 0.42,
            breakdown: ScoreBreakdown { tags: 1.0, ..ScoreBreakdown::default() },
            pool_index: 3,
        };

        let value = serde_json::to_value(Recommendation::from(candidate)).expect("serialize");
        assert_eq!(value, json!({"id": 7, "title": "Genomes"}));
    }

    #[test]
    fn breakdown_total_uses_default_weights() {
        let breakdown = ScoreBreakdown { tags: 1.0, authors: 1.0, downloads: 0.0, recency: 0.0 };
        assert!((breakdown.weighted_total() - 0.5).abs() < 1e-12);
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-12);
    }
}
