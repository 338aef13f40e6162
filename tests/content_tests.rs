use axum::http::StatusCode;
use examprep_api::models::user::UserRole;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_class_crud_roundtrip() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);
    let name = common::unique_name("Class");

    let (status, created) = common::request_json(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": name, "order": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", created);
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["order"], 5);

    let (status, updated) = common::request_json(
        &app,
        "PUT",
        &format!("/api/classes/{}", id),
        Some(&token),
        Some(json!({ "description": "Secondary level" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["description"], "Secondary level");
    assert_eq!(updated["data"]["name"], name);

    let (status, _) = common::request_json(
        &app,
        "DELETE",
        &format!("/api/classes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::request_json(
        &app,
        "GET",
        &format!("/api/classes/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_class_name_conflicts() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);
    let name = common::unique_name("Dup class");

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Class name already exists");
}

#[tokio::test]
async fn test_group_requires_parent_class() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/groups",
        Some(&token),
        Some(json!({ "name": common::unique_name("Orphan group") })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subjects_filter_by_parent_group() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);

    let (_, class) = common::request_json(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": common::unique_name("Filter class") })),
    )
    .await;
    let class_id = class["data"]["id"].as_str().unwrap();

    let (_, group) = common::request_json(
        &app,
        "POST",
        "/api/groups",
        Some(&token),
        Some(json!({ "name": common::unique_name("Science"), "classId": class_id })),
    )
    .await;
    let group_id = group["data"]["id"].as_str().unwrap();

    let subject_name = common::unique_name("Physics");
    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/subjects",
        Some(&token),
        Some(json!({ "name": subject_name, "groupId": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listing) = common::request_json(
        &app,
        "GET",
        &format!("/api/subjects?groupId={}", group_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, vec![subject_name.as_str()]);
}

#[tokio::test]
async fn test_exam_type_uniqueness() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);
    // year varies per run to keep the triple unique across test runs
    let name = common::unique_name("HSC");

    let payload = json!({ "examCategory": "Board", "examName": name, "year": 2023 });
    let (status, _) =
        common::request_json(&app, "POST", "/api/exam-types", Some(&token), Some(payload.clone()))
            .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request_json(&app, "POST", "/api/exam-types", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Exam type already exists");

    // a different year of the same exam is fine
    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/exam-types",
        Some(&token),
        Some(json!({ "examCategory": "Board", "examName": name, "year": 2024 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_exam_type_year_range_validated() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Admin);

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/exam-types",
        Some(&token),
        Some(json!({
            "examCategory": "Board",
            "examName": common::unique_name("SSC"),
            "year": 1800,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_students_cannot_modify_content() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Student);

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/classes",
        Some(&token),
        Some(json!({ "name": common::unique_name("Student class") })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
