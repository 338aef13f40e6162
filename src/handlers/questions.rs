use axum::extract::{Path, Query, State};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    models::question::{
        BulkImportRequest, CreateQuestionRequest, ListQuestionsQuery, QuestionResponse,
    },
    services::{
        question_service::{BulkImportSummary, QuestionService},
        AppState,
    },
};

/// POST /api/questions
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateQuestionRequest>,
) -> Result<ApiSuccess<QuestionResponse>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    Ok(ApiSuccess::created(service.create(req).await?))
}

/// POST /api/questions/bulk
pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<BulkImportRequest>,
) -> Result<ApiSuccess<BulkImportSummary>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    let summary = service.bulk_import(req).await?;
    let message = format!(
        "Imported {} question(s), skipped {}",
        summary.imported, summary.skipped
    );
    Ok(ApiSuccess::created(summary).with_message(message))
}

/// GET /api/questions
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<ApiSuccess<Vec<QuestionResponse>>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    let questions = service.list(query).await?;
    let count = questions.len();
    Ok(ApiSuccess::ok(questions).with_count(count))
}

/// GET /api/questions/{id}
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<QuestionResponse>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    Ok(ApiSuccess::ok(service.get(&id).await?))
}

/// PUT /api/questions/{id}
pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateQuestionRequest>,
) -> Result<ApiSuccess<QuestionResponse>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    Ok(ApiSuccess::ok(service.update(&id, req).await?))
}

/// DELETE /api/questions/{id}
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let service = QuestionService::new(state.mongo.clone());
    service.delete(&id).await?;
    Ok(ApiSuccess::ok(()).with_message("Question deleted successfully"))
}
