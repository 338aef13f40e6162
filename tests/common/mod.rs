#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tower::ServiceExt;

use examprep_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::user::UserRole,
    services::AppState,
};

pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    dotenvy::from_filename(".env.test").ok();

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let app_state = Arc::new(
        AppState::new(config, mongo_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    create_router(app_state)
}

/// Mint a token directly, bypassing registration, so tests can act as any
/// role. Returns the token and the hex user id baked into it.
pub fn auth_token(role: UserRole) -> (String, String) {
    dotenvy::from_filename(".env.test").ok();
    let config = Config::load().expect("Failed to load test configuration");
    let jwt = JwtService::new(&config.jwt_secret);

    let user_id = ObjectId::new().to_hex();
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.clone(),
        role,
        exp: (now + Duration::hours(1)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = jwt.generate_token(claims).expect("Failed to mint token");
    (token, user_id)
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}

pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, uuid::Uuid::new_v4())
}

/// Create a valid MCQ question via the API; returns its id.
pub async fn create_question(app: &Router, staff_token: &str) -> String {
    let body = serde_json::json!({
        "questionTextEn": "What is 2 + 2?",
        "options": [
            { "text": "3", "isCorrect": false },
            { "text": "4", "isCorrect": true }
        ],
        "subjectId": ObjectId::new().to_hex(),
        "chapterId": ObjectId::new().to_hex(),
        "topicId": ObjectId::new().to_hex(),
    });

    let (status, json) = request_json(app, "POST", "/api/questions", Some(staff_token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "question create failed: {}", json);
    json["data"]["id"].as_str().unwrap().to_string()
}
