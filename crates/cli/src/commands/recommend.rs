use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::commands::{open_database, prepare, CommandFailure, CommandResult};
use dsreco_core::config::{ConfigOverrides, LoadOptions};
use dsreco_core::domain::dataset::DatasetId;
use dsreco_core::errors::{ApplicationError, DomainError, InterfaceError};
use dsreco_core::recommender::{DatasetRecommenderService, Recommendation, ScoredCandidate};
use dsreco_db::repositories::{
    DatasetRepository, SqlDatasetRepository, SqlDownloadRecordRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendArgs {
    pub dataset_id: i64,
    /// Overrides `recommender.top_k` when set
    pub k: Option<usize>,
    pub explain: bool,
}

#[derive(Debug, Serialize)]
struct RecommendationPayload {
    dataset_id: DatasetId,
    recommended_datasets: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<Vec<ScoredCandidate>>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let dataset_id = DatasetId(args.dataset_id);

    if args.k == Some(0) {
        let error = ApplicationError::from(DomainError::InvariantViolation(
            "k must be at least 1".to_string(),
        ));
        return interface_failure(error, dataset_id);
    }

    let options = LoadOptions {
        overrides: ConfigOverrides { top_k: args.k, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };
    let (config, runtime) = match prepare("recommend", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let datasets = Arc::new(SqlDatasetRepository::new(pool.clone()));
        let downloads = Arc::new(SqlDownloadRecordRepository::new(pool.clone()));

        let outcome: Result<Vec<ScoredCandidate>, ApplicationError> = async {
            let target = datasets
                .find_by_id(&dataset_id)
                .await
                .map_err(ApplicationError::from)?
                .ok_or(ApplicationError::NotFound(dataset_id))?;

            let service =
                DatasetRecommenderService::with_k(datasets, downloads, config.recommender.top_k);
            service.score_candidates_at(&target, Utc::now()).await
        }
        .await;

        pool.close().await;
        Ok::<_, CommandFailure>(outcome)
    });

    match result {
        Ok(Ok(ranked)) => {
            CommandResult::payload("recommend", &build_payload(dataset_id, ranked, args.explain))
        }
        Ok(Err(error)) => interface_failure(error, dataset_id),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}

fn build_payload(
    dataset_id: DatasetId,
    ranked: Vec<ScoredCandidate>,
    explain: bool,
) -> RecommendationPayload {
    let recommended_datasets = ranked.iter().cloned().map(Recommendation::from).collect();
    RecommendationPayload {
        dataset_id,
        recommended_datasets,
        explanation: explain.then_some(ranked),
    }
}

fn interface_failure(error: ApplicationError, dataset_id: DatasetId) -> CommandResult {
    tracing::warn!(
        event_name = "cli.recommend.failed",
        dataset_id = dataset_id.0,
        error = %error,
        "recommendation request failed"
    );

    let mapped = error.into_interface(format!("cli-recommend-{dataset_id}"));
    let exit_code = exit_code_for(&mapped);
    CommandResult::failure(
        "recommend",
        mapped.error_class(),
        format!("{} ({mapped})", mapped.user_message()),
        exit_code,
    )
}

fn exit_code_for(error: &InterfaceError) -> u8 {
    match error {
        InterfaceError::ServiceUnavailable { .. } => 4,
        InterfaceError::NotFound { .. } => 6,
        InterfaceError::BadRequest { .. } => 7,
        InterfaceError::Internal { .. } => 1,
    }
}
