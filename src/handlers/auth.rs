use axum::{extract::State, Extension};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    middlewares::auth::{JwtClaims, JwtService},
    models::user::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
    services::{auth_service::AuthService, AppState},
};

fn auth_service(state: &AppState) -> AuthService {
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    AuthService::new(state.mongo.clone(), jwt_service)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<ApiSuccess<AuthResponse>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let response = auth_service(&state).register(req).await?;
    Ok(ApiSuccess::created(response))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<ApiSuccess<AuthResponse>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let response = auth_service(&state).login(req).await?;
    Ok(ApiSuccess::ok(response))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    let profile = auth_service(&state).me(&claims).await?;
    Ok(ApiSuccess::ok(profile))
}
