use axum::http::StatusCode;
use examprep_api::models::user::UserRole;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

mod common;

fn mcq_entry(text: &str) -> serde_json::Value {
    json!({
        "questionTextEn": text,
        "options": [
            { "text": "yes", "isCorrect": true },
            { "text": "no", "isCorrect": false }
        ],
        "subjectId": ObjectId::new().to_hex(),
        "chapterId": ObjectId::new().to_hex(),
        "topicId": ObjectId::new().to_hex(),
    })
}

#[tokio::test]
async fn test_update_replaces_question_document() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);

    let question_id = common::create_question(&app, &staff_token).await;

    let (status, body) = common::request_json(
        &app,
        "PUT",
        &format!("/api/questions/{}", question_id),
        Some(&staff_token),
        Some(mcq_entry("What is 3 + 3?")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"]["id"], question_id);
    assert_eq!(body["data"]["questionTextEn"], "What is 3 + 3?");

    let (status, body) = common::request_json(
        &app,
        "GET",
        &format!("/api/questions/{}", question_id),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["questionTextEn"], "What is 3 + 3?");
}

#[tokio::test]
async fn test_update_rejects_invalid_shape() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);

    let question_id = common::create_question(&app, &staff_token).await;

    let mut invalid = mcq_entry("Only one option");
    invalid["options"] = json!([{ "text": "lonely", "isCorrect": true }]);

    let (status, _) = common::request_json(
        &app,
        "PUT",
        &format!("/api/questions/{}", question_id),
        Some(&staff_token),
        Some(invalid),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_import_skips_invalid_rows() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);

    let mut missing_text = mcq_entry("dropped below");
    missing_text
        .as_object_mut()
        .unwrap()
        .remove("questionTextEn");

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/questions/bulk",
        Some(&staff_token),
        Some(json!({
            "questions": [mcq_entry("Bulk one"), missing_text, mcq_entry("Bulk two")]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["imported"], 2);
    assert_eq!(body["data"]["skipped"], 1);
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_import_with_no_valid_rows_is_rejected() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);

    let mut missing_text = mcq_entry("dropped");
    missing_text
        .as_object_mut()
        .unwrap()
        .remove("questionTextEn");

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/questions/bulk",
        Some(&staff_token),
        Some(json!({ "questions": [missing_text] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No valid questions provided");
}

#[tokio::test]
async fn test_bulk_import_with_empty_list_is_rejected() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/questions/bulk",
        Some(&staff_token),
        Some(json!({ "questions": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide questions to import");
}
