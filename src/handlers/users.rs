use axum::extract::{Path, Query, State};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{ApiError, ApiSuccess},
    extractors::AppJson,
    middlewares::auth::JwtService,
    models::user::{
        ChangeRoleRequest, ChangeStatusRequest, CreateUserRequest, ListUsersQuery,
        ResetPasswordRequest, UpdateUserRequest, UserProfile,
    },
    services::{auth_service::AuthService, user_service::UserService, AppState},
};

fn services(state: &AppState) -> (UserService, AuthService) {
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    (
        UserService::new(state.mongo.clone()),
        AuthService::new(state.mongo.clone(), jwt_service),
    )
}

/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (users, auth) = services(&state);
    let profile = users.create(&auth, req).await?;
    Ok(ApiSuccess::created(profile))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiSuccess<Vec<UserProfile>>, ApiError> {
    let (users, _) = services(&state);
    let (profiles, total) = users.list(query).await?;
    Ok(ApiSuccess::ok(profiles).with_count(total as usize))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    let (users, _) = services(&state);
    Ok(ApiSuccess::ok(users.get(&id).await?))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    let (users, _) = services(&state);
    Ok(ApiSuccess::ok(users.update(&id, req).await?))
}

/// PATCH /api/users/{id}/role
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<ChangeRoleRequest>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    let (users, _) = services(&state);
    Ok(ApiSuccess::ok(users.change_role(&id, req.role).await?))
}

/// PATCH /api/users/{id}/status
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<ChangeStatusRequest>,
) -> Result<ApiSuccess<UserProfile>, ApiError> {
    let (users, _) = services(&state);
    Ok(ApiSuccess::ok(users.change_status(&id, req.status).await?))
}

/// POST /api/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (users, auth) = services(&state);
    users.reset_password(&auth, &id, &req.password).await?;
    Ok(ApiSuccess::ok(()).with_message("Password reset successfully"))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let (users, _) = services(&state);
    users.delete(&id).await?;
    Ok(ApiSuccess::ok(()).with_message("User deleted successfully"))
}
