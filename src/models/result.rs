use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono;

/// One student's authoritative result for one exam. A unique index on
/// (examId, studentId) backs the at-most-one-result invariant; resubmission
/// overwrites via upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "examId")]
    pub exam_id: ObjectId,
    #[serde(rename = "studentId")]
    pub student_id: ObjectId,
    /// question-id -> submitted answer, opaque per question type.
    pub answers: Document,
    pub score: f64,
    #[serde(rename = "totalMarks")]
    pub total_marks: f64,
    pub percentage: f64,
    /// Seconds spent.
    #[serde(rename = "timeTaken")]
    pub time_taken: i64,
    #[serde(rename = "submittedAt", with = "bson_datetime_as_chrono")]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    #[serde(rename = "examId")]
    pub exam_id: Option<String>,
    pub answers: Option<serde_json::Map<String, serde_json::Value>>,
    pub score: Option<f64>,
    #[serde(rename = "totalMarks")]
    pub total_marks: Option<f64>,
    pub percentage: Option<f64>,
    #[serde(rename = "timeTaken")]
    pub time_taken: Option<i64>,
}

impl SubmitResultRequest {
    /// Presence check: everything is required, but zero is a valid score.
    pub fn is_complete(&self) -> bool {
        self.exam_id.is_some()
            && self.answers.is_some()
            && self.score.is_some()
            && self.total_marks.is_some()
            && self.percentage.is_some()
            && self.time_taken.is_some()
    }
}

/// Result as returned to clients, with exam or student context denormalized
/// depending on who is asking.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: String,
    #[serde(rename = "examId")]
    pub exam_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub answers: serde_json::Value,
    pub score: f64,
    #[serde(rename = "totalMarks")]
    pub total_marks: f64,
    pub percentage: f64,
    #[serde(rename = "timeTaken")]
    pub time_taken: i64,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
    /// Exam title + subject, attached on a student's own listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam: Option<ResultExamContext>,
    /// Student identity, attached on the staff per-exam listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<ResultStudentContext>,
}

#[derive(Debug, Serialize)]
pub struct ResultExamContext {
    pub title: String,
    #[serde(rename = "subjectName", skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultStudentContext {
    pub name: String,
    pub email: String,
}

impl From<ExamResult> for ResultResponse {
    fn from(result: ExamResult) -> Self {
        let answers = serde_json::to_value(&result.answers).unwrap_or(serde_json::Value::Null);
        ResultResponse {
            id: result.id.map(|id| id.to_hex()).unwrap_or_default(),
            exam_id: result.exam_id.to_hex(),
            student_id: result.student_id.to_hex(),
            answers,
            score: result.score,
            total_marks: result.total_marks,
            percentage: result.percentage,
            time_taken: result.time_taken,
            submitted_at: result.submitted_at,
            exam: None,
            student: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_score_passes_presence_check() {
        let req: SubmitResultRequest = serde_json::from_str(
            r#"{
                "examId": "507f1f77bcf86cd799439011",
                "answers": {},
                "score": 0,
                "totalMarks": 100,
                "percentage": 0,
                "timeTaken": 45
            }"#,
        )
        .unwrap();
        assert!(req.is_complete());
    }

    #[test]
    fn missing_percentage_fails_presence_check() {
        let req: SubmitResultRequest = serde_json::from_str(
            r#"{
                "examId": "507f1f77bcf86cd799439011",
                "answers": {},
                "score": 10,
                "totalMarks": 100,
                "timeTaken": 45
            }"#,
        )
        .unwrap();
        assert!(!req.is_complete());
    }
}
