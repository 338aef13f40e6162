use axum::{
    extract::{Path, State},
    Extension,
};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    metrics::RESULTS_SUBMITTED_TOTAL,
    middlewares::auth::JwtClaims,
    models::result::{ResultResponse, SubmitResultRequest},
    services::{result_service::ResultService, AppState},
};

/// POST /api/exam-results
pub async fn submit_result(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<SubmitResultRequest>,
) -> Result<ApiSuccess<ResultResponse>, ApiError> {
    let service = ResultService::new(state.mongo.clone());
    let result = service.submit(&claims, req).await;
    let outcome = if result.is_ok() { "accepted" } else { "rejected" };
    RESULTS_SUBMITTED_TOTAL.with_label_values(&[outcome]).inc();
    Ok(ApiSuccess::created(result?))
}

/// GET /api/exam-results/mine
pub async fn my_results(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<ApiSuccess<Vec<ResultResponse>>, ApiError> {
    let service = ResultService::new(state.mongo.clone());
    let results = service.my_results(&claims).await?;
    let count = results.len();
    Ok(ApiSuccess::ok(results).with_count(count))
}

/// GET /api/exam-results/exam/{examId}
pub async fn results_by_exam(
    State(state): State<Arc<AppState>>,
    Path(exam_id): Path<String>,
) -> Result<ApiSuccess<Vec<ResultResponse>>, ApiError> {
    let service = ResultService::new(state.mongo.clone());
    let results = service.by_exam(&exam_id).await?;
    let count = results.len();
    Ok(ApiSuccess::ok(results).with_count(count))
}
