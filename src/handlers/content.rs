use axum::extract::{Path, Query, State};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    models::hierarchy::{
        Chapter, Class, CreateExamTypeRequest, CreateNodeRequest, ExamTypeResponse, Group,
        ListNodesQuery, NodeResponse, Subject, Topic, UpdateExamTypeRequest, UpdateNodeRequest,
    },
    services::{content_service::ContentService, AppState},
};

/// One CRUD handler set per hierarchy level, all backed by the shared
/// generic service methods.
macro_rules! node_handlers {
    ($create:ident, $list:ident, $get:ident, $update:ident, $delete:ident, $ty:ty) => {
        pub async fn $create(
            State(state): State<Arc<AppState>>,
            AppJson(req): AppJson<CreateNodeRequest>,
        ) -> Result<ApiSuccess<NodeResponse>, ApiError> {
            req.validate()
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            let service = ContentService::new(state.mongo.clone());
            Ok(ApiSuccess::created(service.create_node::<$ty>(req).await?))
        }

        pub async fn $list(
            State(state): State<Arc<AppState>>,
            Query(query): Query<ListNodesQuery>,
        ) -> Result<ApiSuccess<Vec<NodeResponse>>, ApiError> {
            let service = ContentService::new(state.mongo.clone());
            let nodes = service.list_nodes::<$ty>(query).await?;
            let count = nodes.len();
            Ok(ApiSuccess::ok(nodes).with_count(count))
        }

        pub async fn $get(
            State(state): State<Arc<AppState>>,
            Path(id): Path<String>,
        ) -> Result<ApiSuccess<NodeResponse>, ApiError> {
            let service = ContentService::new(state.mongo.clone());
            Ok(ApiSuccess::ok(service.get_node::<$ty>(&id).await?))
        }

        pub async fn $update(
            State(state): State<Arc<AppState>>,
            Path(id): Path<String>,
            AppJson(req): AppJson<UpdateNodeRequest>,
        ) -> Result<ApiSuccess<NodeResponse>, ApiError> {
            let service = ContentService::new(state.mongo.clone());
            Ok(ApiSuccess::ok(service.update_node::<$ty>(&id, req).await?))
        }

        pub async fn $delete(
            State(state): State<Arc<AppState>>,
            Path(id): Path<String>,
        ) -> Result<ApiSuccess<()>, ApiError> {
            let service = ContentService::new(state.mongo.clone());
            service.delete_node::<$ty>(&id).await?;
            Ok(ApiSuccess::ok(()).with_message("Deleted successfully"))
        }
    };
}

node_handlers!(create_class, list_classes, get_class, update_class, delete_class, Class);
node_handlers!(create_group, list_groups, get_group, update_group, delete_group, Group);
node_handlers!(create_subject, list_subjects, get_subject, update_subject, delete_subject, Subject);
node_handlers!(create_chapter, list_chapters, get_chapter, update_chapter, delete_chapter, Chapter);
node_handlers!(create_topic, list_topics, get_topic, update_topic, delete_topic, Topic);

/// POST /api/exam-types
pub async fn create_exam_type(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateExamTypeRequest>,
) -> Result<ApiSuccess<ExamTypeResponse>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let service = ContentService::new(state.mongo.clone());
    Ok(ApiSuccess::created(service.create_exam_type(req).await?))
}

/// GET /api/exam-types
pub async fn list_exam_types(
    State(state): State<Arc<AppState>>,
) -> Result<ApiSuccess<Vec<ExamTypeResponse>>, ApiError> {
    let service = ContentService::new(state.mongo.clone());
    let exam_types = service.list_exam_types().await?;
    let count = exam_types.len();
    Ok(ApiSuccess::ok(exam_types).with_count(count))
}

/// PUT /api/exam-types/{id}
pub async fn update_exam_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateExamTypeRequest>,
) -> Result<ApiSuccess<ExamTypeResponse>, ApiError> {
    let service = ContentService::new(state.mongo.clone());
    Ok(ApiSuccess::ok(service.update_exam_type(&id, req).await?))
}

/// DELETE /api/exam-types/{id}
pub async fn delete_exam_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let service = ContentService::new(state.mongo.clone());
    service.delete_exam_type(&id).await?;
    Ok(ApiSuccess::ok(()).with_message("Deleted successfully"))
}
