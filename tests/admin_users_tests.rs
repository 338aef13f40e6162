use axum::http::StatusCode;
use examprep_api::models::user::UserRole;
use serde_json::json;

mod common;

async fn create_user(app: &axum::Router, admin_token: &str, role: &str) -> (String, String) {
    let email = common::unique_email("managed");
    let (status, body) = common::request_json(
        app,
        "POST",
        "/api/users",
        Some(admin_token),
        Some(json!({
            "name": "Managed User",
            "email": email,
            "password": "managed-password",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    (body["data"]["id"].as_str().unwrap().to_string(), email)
}

#[tokio::test]
async fn test_admin_creates_teacher_account() {
    let app = common::create_test_app().await;
    let (admin_token, _) = common::auth_token(UserRole::Admin);

    let email = common::unique_email("teacher");
    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(json!({
            "name": "New Teacher",
            "email": email,
            "password": "teacher-password",
            "role": "teacher",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "teacher");

    // the account can actually log in
    let (status, login) = common::request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "teacher-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["data"]["user"]["role"], "teacher");
}

#[tokio::test]
async fn test_teachers_cannot_manage_users() {
    let app = common::create_test_app().await;
    let (teacher_token, _) = common::auth_token(UserRole::Teacher);

    let (status, _) =
        common::request_json(&app, "GET", "/api/users", Some(&teacher_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_takes_effect() {
    let app = common::create_test_app().await;
    let (admin_token, _) = common::auth_token(UserRole::Admin);
    let (user_id, _) = create_user(&app, &admin_token, "student").await;

    let (status, body) = common::request_json(
        &app,
        "PATCH",
        &format!("/api/users/{}/role", user_id),
        Some(&admin_token),
        Some(json!({ "role": "teacher" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "teacher");
}

#[tokio::test]
async fn test_deactivated_user_cannot_login() {
    let app = common::create_test_app().await;
    let (admin_token, _) = common::auth_token(UserRole::Admin);
    let (user_id, email) = create_user(&app, &admin_token, "student").await;

    let (status, _) = common::request_json(
        &app,
        "PATCH",
        &format!("/api/users/{}/status", user_id),
        Some(&admin_token),
        Some(json!({ "status": "inactive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "managed-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Your account has been deactivated");
}

#[tokio::test]
async fn test_password_reset_allows_new_login() {
    let app = common::create_test_app().await;
    let (admin_token, _) = common::auth_token(UserRole::Admin);
    let (user_id, email) = create_user(&app, &admin_token, "student").await;

    let (status, _) = common::request_json(
        &app,
        "POST",
        &format!("/api/users/{}/reset-password", user_id),
        Some(&admin_token),
        Some(json!({ "password": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "managed-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_users_filters_by_email() {
    let app = common::create_test_app().await;
    let (admin_token, _) = common::auth_token(UserRole::Admin);
    let (_, email) = create_user(&app, &admin_token, "student").await;

    let (status, body) = common::request_json(
        &app,
        "GET",
        &format!("/api/users?email={}", email),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], email);
    assert_eq!(body["count"], 1);
}
