use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_register_success() {
    let app = common::create_test_app().await;
    let email = common::unique_email("register");

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Test Student",
            "email": email,
            "password": "super-secret-pw",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["email"], email);
    // self-registration always yields a student account
    assert_eq!(body["data"]["user"]["role"], "student");
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let app = common::create_test_app().await;
    let email = common::unique_email("dup");
    let payload = json!({
        "name": "Test Student",
        "email": email,
        "password": "super-secret-pw",
    });

    let (status, _) =
        common::request_json(&app, "POST", "/api/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request_json(&app, "POST", "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "User with this email already exists");
}

#[tokio::test]
async fn test_register_short_password_rejected() {
    let app = common::create_test_app().await;

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Test Student",
            "email": common::unique_email("shortpw"),
            "password": "short",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_wrong_password_rejected() {
    let app = common::create_test_app().await;
    let email = common::unique_email("login");

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Test Student",
            "email": email,
            "password": "super-secret-pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_me_returns_profile() {
    let app = common::create_test_app().await;
    let email = common::unique_email("me");

    let (_, registered) = common::request_json(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Profile User",
            "email": email,
            "password": "super-secret-pw",
        })),
    )
    .await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    let (status, body) =
        common::request_json(&app, "GET", "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["name"], "Profile User");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = common::create_test_app().await;

    let (status, _) = common::request_json(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
