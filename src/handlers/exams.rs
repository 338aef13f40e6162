use axum::{
    extract::{Path, State},
    Extension,
};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    metrics::EXAMS_PUBLISHED_TOTAL,
    middlewares::auth::JwtClaims,
    models::exam::{CreateExamRequest, ExamResponse, UpdateExamRequest},
    services::{exam_service::ExamService, AppState},
};

/// POST /api/exams
pub async fn create_exam(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateExamRequest>,
) -> Result<ApiSuccess<ExamResponse>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    Ok(ApiSuccess::created(service.create(&claims, req).await?))
}

/// GET /api/exams
pub async fn list_exams(
    State(state): State<Arc<AppState>>,
) -> Result<ApiSuccess<Vec<ExamResponse>>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let exams = service.list_all().await?;
    let count = exams.len();
    Ok(ApiSuccess::ok(exams).with_count(count))
}

/// GET /api/exams/mine
pub async fn my_exams(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<ApiSuccess<Vec<ExamResponse>>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let exams = service.my_exams(&claims).await?;
    let count = exams.len();
    Ok(ApiSuccess::ok(exams).with_count(count))
}

/// GET /api/exams/{id}
pub async fn get_exam(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ExamResponse>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    Ok(ApiSuccess::ok(service.get(&id).await?))
}

/// PUT /api/exams/{id}
pub async fn update_exam(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateExamRequest>,
) -> Result<ApiSuccess<ExamResponse>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    Ok(ApiSuccess::ok(service.update(&id, req).await?))
}

/// PATCH /api/exams/{id}/publish
pub async fn publish_exam(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ExamResponse>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let exam = service.publish(&id).await?;
    EXAMS_PUBLISHED_TOTAL.with_label_values(&["publish"]).inc();
    Ok(ApiSuccess::ok(exam).with_message("Exam published successfully"))
}

/// PATCH /api/exams/{id}/unpublish
pub async fn unpublish_exam(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ExamResponse>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    let exam = service.unpublish(&id).await?;
    EXAMS_PUBLISHED_TOTAL
        .with_label_values(&["unpublish"])
        .inc();
    Ok(ApiSuccess::ok(exam).with_message("Exam unpublished successfully"))
}

/// DELETE /api/exams/{id}
pub async fn delete_exam(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let service = ExamService::new(state.mongo.clone());
    service.delete(&id).await?;
    Ok(ApiSuccess::ok(()).with_message("Exam deleted successfully"))
}
