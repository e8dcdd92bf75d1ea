pub mod config;
pub mod domain;
pub mod errors;
pub mod recommender;

pub use domain::dataset::{Author, AuthorId, Dataset, DatasetId, DatasetMetadata};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommender::{
    DatasetPool, DatasetRecommenderService, DownloadCounter, Recommendation, ScoreBreakdown,
    ScoredCandidate, SimilarityCalculator,
};
