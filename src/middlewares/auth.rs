use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::user::UserRole;
use crate::services::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    /// User id (hex ObjectId).
    pub sub: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    ExpiredToken,
    MissingToken,
    InvalidSignature,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token expired"),
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AuthError::InvalidToken)
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::default();

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                if e.to_string().contains("ExpiredSignature") {
                    AuthError::ExpiredToken
                } else if e.to_string().contains("InvalidSignature") {
                    AuthError::InvalidSignature
                } else {
                    AuthError::InvalidToken
                }
            })
    }
}

/// Require a valid bearer token; stores the claims in request extensions for
/// handlers and the role guards downstream.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Authentication("Missing authorization token".to_string()))?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let claims = jwt_service.validate_token(token).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        ApiError::Authentication(e.to_string())
    })?;

    tracing::debug!(
        "Authenticated user: {} (role: {})",
        claims.sub,
        claims.role.as_str()
    );

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Teacher-or-admin gate for the authoring and grading surfaces.
pub async fn staff_guard_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<JwtClaims>() {
        Some(claims) if claims.role.is_staff() => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Access denied: staff role required");
            Err(ApiError::Authorization(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

pub async fn admin_guard_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<JwtClaims>() {
        Some(claims) if claims.role == UserRole::Admin => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Access denied: admin role required");
            Err(ApiError::Authorization(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = JwtService::new("test-secret");

        let claims = JwtClaims {
            sub: "507f1f77bcf86cd799439011".to_string(),
            role: UserRole::Student,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };

        let token = service.generate_token(claims.clone()).unwrap();
        let validated = service.validate_token(&token).unwrap();

        assert_eq!(validated.sub, claims.sub);
        assert_eq!(validated.role, claims.role);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = JwtService::new("test-secret");
        let claims = JwtClaims {
            sub: "507f1f77bcf86cd799439011".to_string(),
            role: UserRole::Admin,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let token = service.generate_token(claims).unwrap();

        let other = JwtService::new("other-secret");
        assert!(other.validate_token(&token).is_err());
    }
}
