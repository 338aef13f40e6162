use axum::http::StatusCode;
use examprep_api::models::user::UserRole;
use serde_json::json;

mod common;

async fn create_open_exam(app: &axum::Router, staff_token: &str) -> (String, String) {
    let title = common::unique_name("Result exam");
    let (status, body) = common::request_json(
        app,
        "POST",
        "/api/exams",
        Some(staff_token),
        Some(json!({
            "title": title,
            "duration": 60,
            "totalMarks": 100,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    (body["data"]["id"].as_str().unwrap().to_string(), title)
}

fn submission(exam_id: &str, score: f64) -> serde_json::Value {
    json!({
        "examId": exam_id,
        "answers": { "q1": "a" },
        "score": score,
        "totalMarks": 100,
        "percentage": score,
        "timeTaken": 120,
    })
}

#[tokio::test]
async fn test_submit_missing_fields_rejected() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Student);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&token),
        Some(json!({ "examId": mongodb::bson::oid::ObjectId::new().to_hex(), "score": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_submit_unknown_exam_is_not_found() {
    let app = common::create_test_app().await;
    let (token, _) = common::auth_token(UserRole::Student);

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&token),
        Some(submission(&mongodb::bson::oid::ObjectId::new().to_hex(), 10.0)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Exam not found");
}

#[tokio::test]
async fn test_resubmission_replaces_previous_result() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);
    let (student_token, student_id) = common::auth_token(UserRole::Student);

    let (exam_id, _) = create_open_exam(&app, &staff_token).await;

    let (status, first) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&student_token),
        Some(submission(&exam_id, 40.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", first);
    assert_eq!(first["data"]["score"], 40.0);

    let (status, second) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&student_token),
        Some(submission(&exam_id, 75.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["data"]["score"], 75.0);
    // same ledger row, overwritten
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let (status, listing) = common::request_json(
        &app,
        "GET",
        &format!("/api/exam-results/exam/{}", exam_id),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<_> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["studentId"] == student_id.as_str())
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["score"], 75.0);
}

#[tokio::test]
async fn test_zero_score_submission_is_accepted() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);
    let (student_token, _) = common::auth_token(UserRole::Student);

    let (exam_id, _) = create_open_exam(&app, &staff_token).await;

    let (status, body) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&student_token),
        Some(submission(&exam_id, 0.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body["data"]["score"], 0.0);
}

#[tokio::test]
async fn test_my_results_include_exam_context() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);
    let (student_token, _) = common::auth_token(UserRole::Student);

    let (exam_id, title) = create_open_exam(&app, &staff_token).await;

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&student_token),
        Some(submission(&exam_id, 55.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request_json(&app, "GET", "/api/exam-results/mine", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["examId"], exam_id);
    assert_eq!(results[0]["exam"]["title"], title);
}

#[tokio::test]
async fn test_completed_exam_shows_as_previous() {
    let app = common::create_test_app().await;
    let (staff_token, _) = common::auth_token(UserRole::Teacher);
    let (student_token, _) = common::auth_token(UserRole::Student);

    let (exam_id, title) = create_open_exam(&app, &staff_token).await;

    let (status, _) = common::request_json(
        &app,
        "POST",
        "/api/exam-results",
        Some(&student_token),
        Some(submission(&exam_id, 88.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::request_json(&app, "GET", "/api/exams/mine", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let exam = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["title"] == title.as_str())
        .unwrap_or_else(|| panic!("exam {} missing from catalog", exam_id));
    assert_eq!(exam["userStatus"], "previous");
}
