//! Scoring primitives for dataset recommendations

use std::collections::HashSet;
use std::hash::Hash;

use chrono::{DateTime, Utc};

use super::types::{ScoreBreakdown, ScoringInput};
use super::{RECENCY_HORIZON_DAYS, SECONDS_PER_DAY};
use crate::domain::dataset::Dataset;

/// Stateless similarity and utility scores between a target and a candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityCalculator;

impl SimilarityCalculator {
    /// `|A ∩ B| / |A ∪ B|`, or 0.0 when both sets are empty.
    pub fn jaccard_similarity<T: Eq + Hash>(set_a: &HashSet<T>, set_b: &HashSet<T>) -> f64 {
        let union = set_a.union(set_b).count();
        if union == 0 {
            return 0.0;
        }
        set_a.intersection(set_b).count() as f64 / union as f64
    }

    /// Linear scaling, not clamped. Returns 0.0 for a non-positive denominator.
    pub fn normalize(value: f64, max_value: f64) -> f64 {
        if max_value > 0.0 {
            value / max_value
        } else {
            0.0
        }
    }

    pub fn calculate_tag_score(target: &Dataset, candidate: &Dataset) -> f64 {
        Self::jaccard_similarity(&target.tag_set(), &candidate.tag_set())
    }

    pub fn calculate_author_score(target: &Dataset, candidate: &Dataset) -> f64 {
        Self::jaccard_similarity(&target.author_ids(), &candidate.author_ids())
    }

    pub fn calculate_recency_score(candidate: &Dataset, max_age_days: i64) -> f64 {
        Self::calculate_recency_score_at(candidate, max_age_days, Utc::now())
    }

    /// Linear decay from 1.0 at `now` to 0.0 at `max_age_days`, clamped to
    /// `[0.0, 1.0]` so future timestamps cannot exceed 1.0.
    pub fn calculate_recency_score_at(
        candidate: &Dataset,
        max_age_days: i64,
        now: DateTime<Utc>,
    ) -> f64 {
        let age_seconds = (now - candidate.created_at).num_milliseconds() as f64 / 1000.0;
        let max_age_seconds = max_age_days.saturating_mul(SECONDS_PER_DAY) as f64;

        let normalized_age = Self::normalize(age_seconds, max_age_seconds);
        (1.0 - normalized_age).clamp(0.0, 1.0)
    }

    pub fn calculate_final_score(
        target: &Dataset,
        candidate: &Dataset,
        max_downloads: u64,
        downloads_count: u64,
    ) -> f64 {
        Self::calculate_final_score_at(target, candidate, max_downloads, downloads_count, Utc::now())
    }

    pub fn calculate_final_score_at(
        target: &Dataset,
        candidate: &Dataset,
        max_downloads: u64,
        downloads_count: u64,
        now: DateTime<Utc>,
    ) -> f64 {
        let input = ScoringInput { dataset: candidate, downloads_count };
        Self::score_breakdown_at(target, &input, max_downloads, now).weighted_total()
    }

    /// All four sub-scores for one candidate.
    pub fn score_breakdown_at(
        target: &Dataset,
        input: &ScoringInput<'_>,
        max_downloads: u64,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            tags: Self::calculate_tag_score(target, input.dataset),
            authors: Self::calculate_author_score(target, input.dataset),
            downloads: Self::normalize(input.downloads_count as f64, max_downloads as f64),
            recency: Self::calculate_recency_score_at(input.dataset, RECENCY_HORIZON_DAYS, now),
        }
    }
}
