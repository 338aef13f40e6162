use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

use super::question::QuestionResponse;
use super::{bson_datetime_as_chrono, bson_datetime_as_chrono_option};

/// Authored/publication flag. Distinct from the per-user temporal status
/// derived at read time (`UserExamStatus`), which is never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Draft,
    Scheduled,
    Live,
}

impl ExamStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExamStatus::Draft => "draft",
            ExamStatus::Scheduled => "scheduled",
            ExamStatus::Live => "live",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[default]
    All,
    Specific,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionNumbering {
    #[default]
    Sequential,
    Random,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum QuestionPresentation {
    #[default]
    #[serde(rename = "all-at-once")]
    AllAtOnce,
    #[serde(rename = "one-by-one")]
    OneByOne,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResultVisibility {
    #[default]
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "after-exam-end")]
    AfterExamEnd,
    #[serde(rename = "after-all-complete")]
    AfterAllComplete,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AnswerVisibility {
    #[serde(rename = "immediate")]
    Immediate,
    #[default]
    #[serde(rename = "after-exam-end")]
    AfterExamEnd,
    #[serde(rename = "never")]
    Never,
}

/// Exam document stored in the "exams" collection.
///
/// The presentation/scoring switches (shuffle, numbering, negative marking,
/// visibility...) are pass-through configuration consumed by the exam-taking
/// client; the server stores but does not enforce them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    /// Duration in minutes.
    pub duration: i64,
    #[serde(rename = "totalMarks")]
    pub total_marks: f64,
    #[serde(rename = "questionIds", default)]
    pub question_ids: Vec<ObjectId>,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<String>,
    #[serde(
        rename = "startDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub start_date: Option<DateTime<Utc>>,
    /// Time-of-day "HH:MM" combined with `start_date` into the start instant.
    #[serde(rename = "startTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(
        rename = "endDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(
        rename = "publishedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub published_at: Option<DateTime<Utc>>,
    // Settings
    #[serde(rename = "marksPerQuestion", default = "default_marks_per_question")]
    pub marks_per_question: f64,
    #[serde(rename = "negativeMarking", default)]
    pub negative_marking: bool,
    #[serde(rename = "negativeMarkValue", default)]
    pub negative_mark_value: f64,
    #[serde(rename = "questionNumbering", default)]
    pub question_numbering: QuestionNumbering,
    #[serde(rename = "questionPresentation", default)]
    pub question_presentation: QuestionPresentation,
    #[serde(rename = "shuffleQuestions", default)]
    pub shuffle_questions: bool,
    #[serde(rename = "shuffleOptions", default)]
    pub shuffle_options: bool,
    #[serde(rename = "allowMultipleAttempts", default)]
    pub allow_multiple_attempts: bool,
    #[serde(rename = "allowAnswerChange", default = "default_true")]
    pub allow_answer_change: bool,
    #[serde(rename = "resultVisibility", default)]
    pub result_visibility: ResultVisibility,
    #[serde(rename = "answerVisibility", default)]
    pub answer_visibility: AnswerVisibility,
    #[serde(rename = "autoSubmit", default = "default_true")]
    pub auto_submit: bool,
    // Access control
    #[serde(rename = "accessType", default)]
    pub access_type: AccessType,
    #[serde(rename = "allowedStudents", default)]
    pub allowed_students: Vec<ObjectId>,
    // Educational hierarchy references
    #[serde(rename = "classId", default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ObjectId>,
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ObjectId>,
    #[serde(rename = "subjectId", default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<ObjectId>,
    #[serde(rename = "chapterId", default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<ObjectId>,
    #[serde(rename = "topicId", default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<ObjectId>,
    #[serde(rename = "createdBy", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ObjectId>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

fn default_marks_per_question() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Exam {
    /// New exam with every setting at its documented default. Creation fills
    /// the rest in from the request.
    pub fn new(title: String, duration: i64, total_marks: f64, now: DateTime<Utc>) -> Self {
        Exam {
            id: None,
            title,
            duration,
            total_marks,
            question_ids: Vec::new(),
            status: ExamStatus::Draft,
            description: None,
            instructions: None,
            warnings: None,
            syllabus: None,
            start_date: None,
            start_time: None,
            end_date: None,
            end_time: None,
            published_at: None,
            marks_per_question: 1.0,
            negative_marking: false,
            negative_mark_value: 0.0,
            question_numbering: QuestionNumbering::Sequential,
            question_presentation: QuestionPresentation::AllAtOnce,
            shuffle_questions: false,
            shuffle_options: false,
            allow_multiple_attempts: false,
            allow_answer_change: true,
            result_visibility: ResultVisibility::Immediate,
            answer_visibility: AnswerVisibility::AfterExamEnd,
            auto_submit: true,
            access_type: AccessType::All,
            allowed_students: Vec::new(),
            class_id: None,
            group_id: None,
            subject_id: None,
            chapter_id: None,
            topic_id: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given student may see and attempt this exam.
    pub fn allows_student(&self, student_id: &ObjectId) -> bool {
        self.access_type != AccessType::Specific || self.allowed_students.contains(student_id)
    }
}

/// Read-time classification, computed per requesting student. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserExamStatus {
    Upcoming,
    Live,
    Previous,
}

#[derive(Debug, Deserialize)]
pub struct CreateExamRequest {
    pub title: Option<String>,
    pub duration: Option<i64>,
    #[serde(rename = "totalMarks")]
    pub total_marks: Option<f64>,
    #[serde(rename = "questionIds", default)]
    pub question_ids: Vec<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub warnings: Option<String>,
    pub syllabus: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    #[serde(rename = "marksPerQuestion")]
    pub marks_per_question: Option<f64>,
    #[serde(rename = "negativeMarking")]
    pub negative_marking: Option<bool>,
    #[serde(rename = "negativeMarkValue")]
    pub negative_mark_value: Option<f64>,
    #[serde(rename = "questionNumbering")]
    pub question_numbering: Option<QuestionNumbering>,
    #[serde(rename = "questionPresentation")]
    pub question_presentation: Option<QuestionPresentation>,
    #[serde(rename = "shuffleQuestions")]
    pub shuffle_questions: Option<bool>,
    #[serde(rename = "shuffleOptions")]
    pub shuffle_options: Option<bool>,
    #[serde(rename = "allowMultipleAttempts")]
    pub allow_multiple_attempts: Option<bool>,
    #[serde(rename = "allowAnswerChange")]
    pub allow_answer_change: Option<bool>,
    #[serde(rename = "resultVisibility")]
    pub result_visibility: Option<ResultVisibility>,
    #[serde(rename = "answerVisibility")]
    pub answer_visibility: Option<AnswerVisibility>,
    #[serde(rename = "autoSubmit")]
    pub auto_submit: Option<bool>,
    #[serde(rename = "accessType")]
    pub access_type: Option<AccessType>,
    #[serde(
        rename = "allowedStudents",
        default,
        deserialize_with = "lenient_object_id_list"
    )]
    pub allowed_students: Option<Vec<ObjectId>>,
    #[serde(rename = "classId")]
    pub class_id: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "subjectId")]
    pub subject_id: Option<String>,
    #[serde(rename = "chapterId")]
    pub chapter_id: Option<String>,
    #[serde(rename = "topicId")]
    pub topic_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    pub duration: Option<i64>,
    #[serde(rename = "totalMarks")]
    pub total_marks: Option<f64>,
    #[serde(rename = "questionIds")]
    pub question_ids: Option<Vec<String>>,
    pub status: Option<ExamStatus>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub warnings: Option<String>,
    pub syllabus: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    #[serde(rename = "marksPerQuestion")]
    pub marks_per_question: Option<f64>,
    #[serde(rename = "negativeMarking")]
    pub negative_marking: Option<bool>,
    #[serde(rename = "negativeMarkValue")]
    pub negative_mark_value: Option<f64>,
    #[serde(rename = "questionNumbering")]
    pub question_numbering: Option<QuestionNumbering>,
    #[serde(rename = "questionPresentation")]
    pub question_presentation: Option<QuestionPresentation>,
    #[serde(rename = "shuffleQuestions")]
    pub shuffle_questions: Option<bool>,
    #[serde(rename = "shuffleOptions")]
    pub shuffle_options: Option<bool>,
    #[serde(rename = "allowMultipleAttempts")]
    pub allow_multiple_attempts: Option<bool>,
    #[serde(rename = "allowAnswerChange")]
    pub allow_answer_change: Option<bool>,
    #[serde(rename = "resultVisibility")]
    pub result_visibility: Option<ResultVisibility>,
    #[serde(rename = "answerVisibility")]
    pub answer_visibility: Option<AnswerVisibility>,
    #[serde(rename = "autoSubmit")]
    pub auto_submit: Option<bool>,
    #[serde(rename = "accessType")]
    pub access_type: Option<AccessType>,
    #[serde(
        rename = "allowedStudents",
        default,
        deserialize_with = "lenient_object_id_list"
    )]
    pub allowed_students: Option<Vec<ObjectId>>,
    #[serde(rename = "classId")]
    pub class_id: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "subjectId")]
    pub subject_id: Option<String>,
    #[serde(rename = "chapterId")]
    pub chapter_id: Option<String>,
    #[serde(rename = "topicId")]
    pub topic_id: Option<String>,
}

/// `allowedStudents` tolerates malformed payloads: anything that is not an
/// array of ids coerces to an empty list instead of failing the request.
fn lenient_object_id_list<'de, D>(deserializer: D) -> Result<Option<Vec<ObjectId>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let ids = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| {
                item.as_str()
                    .and_then(|s| ObjectId::parse_str(s).ok())
                    .or_else(|| {
                        // populated form: { "_id": "..." }
                        item.get("_id")
                            .and_then(|id| id.as_str())
                            .and_then(|s| ObjectId::parse_str(s).ok())
                    })
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(Some(ids))
}

/// Exam as returned to clients: hex-string ids, optionally populated
/// questions and a per-user derived status.
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    pub id: String,
    pub title: String,
    pub duration: i64,
    #[serde(rename = "totalMarks")]
    pub total_marks: f64,
    #[serde(rename = "questionIds")]
    pub question_ids: Vec<String>,
    pub status: ExamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<String>,
    #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(rename = "publishedAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "marksPerQuestion")]
    pub marks_per_question: f64,
    #[serde(rename = "negativeMarking")]
    pub negative_marking: bool,
    #[serde(rename = "negativeMarkValue")]
    pub negative_mark_value: f64,
    #[serde(rename = "questionNumbering")]
    pub question_numbering: QuestionNumbering,
    #[serde(rename = "questionPresentation")]
    pub question_presentation: QuestionPresentation,
    #[serde(rename = "shuffleQuestions")]
    pub shuffle_questions: bool,
    #[serde(rename = "shuffleOptions")]
    pub shuffle_options: bool,
    #[serde(rename = "allowMultipleAttempts")]
    pub allow_multiple_attempts: bool,
    #[serde(rename = "allowAnswerChange")]
    pub allow_answer_change: bool,
    #[serde(rename = "resultVisibility")]
    pub result_visibility: ResultVisibility,
    #[serde(rename = "answerVisibility")]
    pub answer_visibility: AnswerVisibility,
    #[serde(rename = "autoSubmit")]
    pub auto_submit: bool,
    #[serde(rename = "accessType")]
    pub access_type: AccessType,
    #[serde(rename = "allowedStudents")]
    pub allowed_students: Vec<String>,
    #[serde(rename = "classId", skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(rename = "subjectId", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(rename = "chapterId", skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    #[serde(rename = "topicId", skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    /// Populated question documents, present on detail reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionResponse>>,
    #[serde(rename = "userStatus", skip_serializing_if = "Option::is_none")]
    pub user_status: Option<UserExamStatus>,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        ExamResponse {
            id: exam.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: exam.title,
            duration: exam.duration,
            total_marks: exam.total_marks,
            question_ids: exam.question_ids.iter().map(|id| id.to_hex()).collect(),
            status: exam.status,
            description: exam.description,
            instructions: exam.instructions,
            warnings: exam.warnings,
            syllabus: exam.syllabus,
            start_date: exam.start_date,
            start_time: exam.start_time,
            end_date: exam.end_date,
            end_time: exam.end_time,
            published_at: exam.published_at,
            marks_per_question: exam.marks_per_question,
            negative_marking: exam.negative_marking,
            negative_mark_value: exam.negative_mark_value,
            question_numbering: exam.question_numbering,
            question_presentation: exam.question_presentation,
            shuffle_questions: exam.shuffle_questions,
            shuffle_options: exam.shuffle_options,
            allow_multiple_attempts: exam.allow_multiple_attempts,
            allow_answer_change: exam.allow_answer_change,
            result_visibility: exam.result_visibility,
            answer_visibility: exam.answer_visibility,
            auto_submit: exam.auto_submit,
            access_type: exam.access_type,
            allowed_students: exam
                .allowed_students
                .iter()
                .map(|id| id.to_hex())
                .collect(),
            class_id: exam.class_id.map(|id| id.to_hex()),
            group_id: exam.group_id.map(|id| id.to_hex()),
            subject_id: exam.subject_id.map(|id| id.to_hex()),
            chapter_id: exam.chapter_id.map(|id| id.to_hex()),
            topic_id: exam.topic_id.map(|id| id.to_hex()),
            created_at: exam.created_at,
            updated_at: exam.updated_at,
            questions: None,
            user_status: None,
        }
    }
}
