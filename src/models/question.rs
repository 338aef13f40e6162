use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono;

/// Question bank entry. Two validated shapes (MCQ, CQ) share one document;
/// `question_type` is an open string set so topic-specific category labels
/// remain storable as classification-only tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "questionTextBn", default, skip_serializing_if = "Option::is_none")]
    pub question_text_bn: Option<String>,
    #[serde(rename = "questionTextEn", default, skip_serializing_if = "Option::is_none")]
    pub question_text_en: Option<String>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(rename = "passageBn", default, skip_serializing_if = "Option::is_none")]
    pub passage_bn: Option<String>,
    #[serde(rename = "passageEn", default, skip_serializing_if = "Option::is_none")]
    pub passage_en: Option<String>,
    #[serde(rename = "subQuestions", default)]
    pub sub_questions: Vec<SubQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(rename = "subjectId")]
    pub subject_id: ObjectId,
    #[serde(rename = "chapterId")]
    pub chapter_id: ObjectId,
    #[serde(rename = "topicId")]
    pub topic_id: ObjectId,
    #[serde(rename = "examTypeId", default, skip_serializing_if = "Option::is_none")]
    pub exam_type_id: Option<ObjectId>,
    #[serde(rename = "questionType", default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

fn default_question_type() -> String {
    "MCQ".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// Labeled comprehension sub-question. Legacy field names (`answer`,
/// `questionText`, `subQuestionType`) are accepted on input and written back
/// under the canonical names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuestion {
    #[serde(default)]
    pub label: String,
    #[serde(
        rename = "questionTextBn",
        alias = "questionText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub question_text_bn: Option<String>,
    #[serde(rename = "questionTextEn", default, skip_serializing_if = "Option::is_none")]
    pub question_text_en: Option<String>,
    #[serde(
        rename = "answerBn",
        alias = "answer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub answer_bn: Option<String>,
    #[serde(rename = "answerEn", default, skip_serializing_if = "Option::is_none")]
    pub answer_en: Option<String>,
    #[serde(
        rename = "type",
        alias = "subQuestionType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Validated shape behind a `question_type` tag. Anything that is not
/// case-insensitively "cq" validates under MCQ rules, including the open set
/// of classification-only category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Mcq,
    Cq,
}

impl QuestionKind {
    pub fn classify(question_type: &str) -> Self {
        if question_type.trim().eq_ignore_ascii_case("cq") {
            QuestionKind::Cq
        } else {
            QuestionKind::Mcq
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    #[serde(rename = "questionTextBn")]
    pub question_text_bn: Option<String>,
    #[serde(rename = "questionTextEn")]
    pub question_text_en: Option<String>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(rename = "passageBn")]
    pub passage_bn: Option<String>,
    #[serde(rename = "passageEn")]
    pub passage_en: Option<String>,
    #[serde(rename = "subQuestions", default)]
    pub sub_questions: Vec<SubQuestion>,
    pub explanation: Option<String>,
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    #[serde(rename = "chapterId")]
    pub chapter_id: String,
    #[serde(rename = "topicId")]
    pub topic_id: String,
    #[serde(rename = "examTypeId")]
    pub exam_type_id: Option<String>,
    #[serde(rename = "questionType")]
    pub question_type: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateQuestionRequest {
    /// Shape validation per question kind. MCQ needs question text in at
    /// least one language, two non-empty options or more. CQ needs a passage
    /// or at least one labeled sub-question with text in some language.
    pub fn validate_shape(&self) -> Result<(), String> {
        let question_type = self.question_type.as_deref().unwrap_or("MCQ");
        match QuestionKind::classify(question_type) {
            QuestionKind::Mcq => {
                let has_text = non_empty(&self.question_text_en) || non_empty(&self.question_text_bn);
                if !has_text {
                    return Err("Please provide question text".to_string());
                }
                if self.options.len() < 2 {
                    return Err("Question must have at least 2 options".to_string());
                }
                if self.options.iter().any(|o| o.text.trim().is_empty()) {
                    return Err("Option text cannot be empty".to_string());
                }
                Ok(())
            }
            QuestionKind::Cq => {
                let has_passage = non_empty(&self.passage_en) || non_empty(&self.passage_bn);
                if !has_passage && self.sub_questions.is_empty() {
                    return Err(
                        "CQ must have a passage or at least one sub-question".to_string()
                    );
                }
                for sq in &self.sub_questions {
                    if sq.label.trim().is_empty() {
                        return Err("Each sub-question must have a label".to_string());
                    }
                    if !non_empty(&sq.question_text_bn) && !non_empty(&sq.question_text_en) {
                        return Err(format!(
                            "Sub-question '{}' must have question text",
                            sq.label
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Question as returned to clients (hex-string ids).
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: String,
    #[serde(rename = "questionTextBn", skip_serializing_if = "Option::is_none")]
    pub question_text_bn: Option<String>,
    #[serde(rename = "questionTextEn", skip_serializing_if = "Option::is_none")]
    pub question_text_en: Option<String>,
    pub options: Vec<QuestionOption>,
    #[serde(rename = "passageBn", skip_serializing_if = "Option::is_none")]
    pub passage_bn: Option<String>,
    #[serde(rename = "passageEn", skip_serializing_if = "Option::is_none")]
    pub passage_en: Option<String>,
    #[serde(rename = "subQuestions")]
    pub sub_questions: Vec<SubQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    #[serde(rename = "chapterId")]
    pub chapter_id: String,
    #[serde(rename = "topicId")]
    pub topic_id: String,
    #[serde(rename = "examTypeId", skip_serializing_if = "Option::is_none")]
    pub exam_type_id: Option<String>,
    #[serde(rename = "questionType")]
    pub question_type: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Question> for QuestionResponse {
    fn from(q: Question) -> Self {
        QuestionResponse {
            id: q.id.map(|id| id.to_hex()).unwrap_or_default(),
            question_text_bn: q.question_text_bn,
            question_text_en: q.question_text_en,
            options: q.options,
            passage_bn: q.passage_bn,
            passage_en: q.passage_en,
            sub_questions: q.sub_questions,
            explanation: q.explanation,
            subject_id: q.subject_id.to_hex(),
            chapter_id: q.chapter_id.to_hex(),
            topic_id: q.topic_id.to_hex(),
            exam_type_id: q.exam_type_id.map(|id| id.to_hex()),
            question_type: q.question_type,
            difficulty: q.difficulty,
            tags: q.tags,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuestionsQuery {
    #[serde(rename = "subjectId")]
    pub subject_id: Option<String>,
    #[serde(rename = "chapterId")]
    pub chapter_id: Option<String>,
    #[serde(rename = "topicId")]
    pub topic_id: Option<String>,
    pub difficulty: Option<String>,
    #[serde(rename = "questionType")]
    pub question_type: Option<String>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_request() -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_text_bn: None,
            question_text_en: Some("What is 2 + 2?".to_string()),
            options: vec![
                QuestionOption { text: "3".to_string(), is_correct: false },
                QuestionOption { text: "4".to_string(), is_correct: true },
            ],
            passage_bn: None,
            passage_en: None,
            sub_questions: vec![],
            explanation: None,
            subject_id: "507f1f77bcf86cd799439011".to_string(),
            chapter_id: "507f1f77bcf86cd799439012".to_string(),
            topic_id: "507f1f77bcf86cd799439013".to_string(),
            exam_type_id: None,
            question_type: None,
            difficulty: None,
            tags: vec![],
        }
    }

    #[test]
    fn mcq_with_two_options_is_valid() {
        assert!(mcq_request().validate_shape().is_ok());
    }

    #[test]
    fn mcq_rejects_single_option() {
        let mut req = mcq_request();
        req.options.truncate(1);
        assert!(req.validate_shape().is_err());
    }

    #[test]
    fn mcq_rejects_empty_option_text() {
        let mut req = mcq_request();
        req.options[0].text = "  ".to_string();
        assert!(req.validate_shape().is_err());
    }

    #[test]
    fn mcq_accepts_bengali_only_text() {
        let mut req = mcq_request();
        req.question_text_en = None;
        req.question_text_bn = Some("২ + ২ = কত?".to_string());
        assert!(req.validate_shape().is_ok());
    }

    #[test]
    fn cq_requires_passage_or_sub_questions() {
        let mut req = mcq_request();
        req.question_type = Some("CQ".to_string());
        req.options.clear();
        assert!(req.validate_shape().is_err());

        req.passage_en = Some("Read the passage below.".to_string());
        assert!(req.validate_shape().is_ok());
    }

    #[test]
    fn cq_sub_question_needs_label_and_text() {
        let mut req = mcq_request();
        req.question_type = Some("cq".to_string());
        req.options.clear();
        req.sub_questions = vec![SubQuestion {
            label: "a".to_string(),
            question_text_bn: None,
            question_text_en: Some("Define the term.".to_string()),
            answer_bn: None,
            answer_en: None,
            sub_type: None,
            marks: None,
        }];
        assert!(req.validate_shape().is_ok());

        req.sub_questions[0].question_text_en = None;
        assert!(req.validate_shape().is_err());
    }

    #[test]
    fn unrecognized_type_falls_back_to_mcq_rules() {
        let mut req = mcq_request();
        req.question_type = Some("জ্ঞানমূলক".to_string());
        assert!(req.validate_shape().is_ok());
        assert_eq!(QuestionKind::classify("জ্ঞানমূলক"), QuestionKind::Mcq);
    }

    #[test]
    fn legacy_sub_question_fields_are_normalized() {
        let json = r#"{
            "label": "a",
            "questionText": "পুরনো প্রশ্ন",
            "answer": "পুরনো উত্তর",
            "subQuestionType": "জ্ঞানমূলক"
        }"#;
        let sq: SubQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(sq.question_text_bn.as_deref(), Some("পুরনো প্রশ্ন"));
        assert_eq!(sq.answer_bn.as_deref(), Some("পুরনো উত্তর"));
        assert_eq!(sq.sub_type.as_deref(), Some("জ্ঞানমূলক"));

        // canonical names on write
        let written = serde_json::to_value(&sq).unwrap();
        assert!(written.get("answerBn").is_some());
        assert!(written.get("answer").is_none());
        assert!(written.get("questionTextBn").is_some());
        assert_eq!(written.get("type").unwrap(), "জ্ঞানমূলক");
    }
}
