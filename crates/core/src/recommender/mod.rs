//! Dataset recommendation engine
//!
//! Content-based ranking of candidate datasets against a target, combining
//! tag overlap, author overlap, download popularity and recency into one
//! weighted score.

mod providers;
mod service;
mod similarity;
mod types;

pub use providers::{DatasetPool, DownloadCounter};
pub use service::{rank, DatasetRecommenderService};
pub use similarity::SimilarityCalculator;
pub use types::*;

/// Weight for tag similarity
pub const WEIGHT_TAGS: f64 = 0.30;

/// Weight for author similarity
pub const WEIGHT_AUTHORS: f64 = 0.20;

/// Weight for download popularity
pub const WEIGHT_DOWNLOADS: f64 = 0.25;

/// Weight for recency
pub const WEIGHT_RECENCY: f64 = 0.25;

/// Fixed scoring weights. They sum to exactly 1.0.
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    tags: WEIGHT_TAGS,
    authors: WEIGHT_AUTHORS,
    downloads: WEIGHT_DOWNLOADS,
    recency: WEIGHT_RECENCY,
};

/// Age after which a candidate's recency score reaches zero (two years).
pub const RECENCY_HORIZON_DAYS: i64 = 365 * 2;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Recommendations returned when no explicit `k` is given
pub const DEFAULT_TOP_K: usize = 5;
