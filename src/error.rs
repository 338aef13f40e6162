use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for all request handlers. Every operation converts its own
/// failures into one of these at the boundary; nothing escapes as a panic or
/// a bare 500 without the JSON envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Unique-constraint violations surface as 400 with a specific
            // message, matching the public API contract.
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            tracing::error!("Unhandled internal error: {:#}", e);
        }
        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(e: mongodb::error::Error) -> Self {
        ApiError::Internal(anyhow::Error::new(e))
    }
}

/// Detect a MongoDB duplicate-key write failure (code 11000) so callers can
/// map it to `ApiError::Conflict` with an entity-specific message.
pub fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
        *e.kind
    {
        return we.code == 11000;
    }
    false
}

/// Parse a path/body id, rejecting malformed values as a 400 instead of
/// letting them surface as storage errors.
pub fn parse_object_id(id: &str, entity: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id)
        .map_err(|_| ApiError::Validation(format!("Invalid {} ID format", entity)))
}

/// Success envelope: `{ success: true, data, [message], [count] }`.
pub struct ApiSuccess<T: Serialize> {
    status: StatusCode,
    data: T,
    message: Option<String>,
    count: Option<usize>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
            message: None,
            count: None,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
            message: None,
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert("success".to_string(), json!(true));
        if let Some(message) = self.message {
            body.insert("message".to_string(), json!(message));
        }
        if let Some(count) = self.count {
            body.insert("count".to_string(), json!(count));
        }
        body.insert(
            "data".to_string(),
            serde_json::to_value(self.data).unwrap_or(serde_json::Value::Null),
        );
        (self.status, Json(serde_json::Value::Object(body))).into_response()
    }
}
