use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document, Regex};
use mongodb::Database;

use crate::error::{parse_object_id, ApiError};
use crate::models::question::{
    BulkImportRequest, CreateQuestionRequest, ListQuestionsQuery, Question, QuestionResponse,
};

pub struct QuestionService {
    mongo: Database,
}

/// Outcome of a bulk import: invalid entries are skipped, not fatal.
#[derive(Debug, serde::Serialize)]
pub struct BulkImportSummary {
    pub imported: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl QuestionService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create(&self, req: CreateQuestionRequest) -> Result<QuestionResponse, ApiError> {
        let question = build_question(req)?;
        let collection = self.collection();
        let insert = collection.insert_one(&question).await?;
        let id = insert
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted question ID")))?;
        let created = collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
        Ok(QuestionResponse::from(created))
    }

    /// Import many questions at once. Each entry is validated independently;
    /// failures are reported per index and the rest still land. A batch with
    /// no valid entries at all is rejected.
    pub async fn bulk_import(&self, req: BulkImportRequest) -> Result<BulkImportSummary, ApiError> {
        if req.questions.is_empty() {
            return Err(ApiError::Validation(
                "Please provide questions to import".to_string(),
            ));
        }

        let mut valid = Vec::new();
        let mut errors = Vec::new();
        for (idx, entry) in req.questions.into_iter().enumerate() {
            match build_question(entry) {
                Ok(question) => valid.push(question),
                Err(e) => errors.push(format!("Question {}: {}", idx + 1, e)),
            }
        }

        if valid.is_empty() {
            return Err(ApiError::Validation(
                "No valid questions provided".to_string(),
            ));
        }

        let imported = valid.len();
        self.collection().insert_many(&valid).await?;

        Ok(BulkImportSummary {
            imported,
            skipped: errors.len(),
            errors,
        })
    }

    pub async fn list(&self, query: ListQuestionsQuery) -> Result<Vec<QuestionResponse>, ApiError> {
        let mut filter = Document::new();
        if let Some(id) = query.subject_id.as_deref() {
            filter.insert("subjectId", parse_object_id(id, "subject")?);
        }
        if let Some(id) = query.chapter_id.as_deref() {
            filter.insert("chapterId", parse_object_id(id, "chapter")?);
        }
        if let Some(id) = query.topic_id.as_deref() {
            filter.insert("topicId", parse_object_id(id, "topic")?);
        }
        if let Some(difficulty) = query.difficulty.as_deref() {
            filter.insert("difficulty", difficulty);
        }
        if let Some(question_type) = query.question_type.as_deref() {
            filter.insert("questionType", question_type);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = Regex {
                pattern: regex_escape(search.trim()),
                options: "i".to_string(),
            };
            filter.insert(
                "$or",
                vec![
                    doc! { "questionTextBn": { "$regex": pattern.clone() } },
                    doc! { "questionTextEn": { "$regex": pattern.clone() } },
                    doc! { "tags": { "$regex": pattern } },
                ],
            );
        }

        let questions: Vec<Question> = self
            .collection()
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;

        Ok(questions.into_iter().map(QuestionResponse::from).collect())
    }

    pub async fn get(&self, question_id: &str) -> Result<QuestionResponse, ApiError> {
        let oid = parse_object_id(question_id, "question")?;
        let question = self
            .collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
        Ok(QuestionResponse::from(question))
    }

    pub async fn update(
        &self,
        question_id: &str,
        req: CreateQuestionRequest,
    ) -> Result<QuestionResponse, ApiError> {
        let oid = parse_object_id(question_id, "question")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

        // Full replacement keeps the validated shape authoritative.
        let mut question = build_question(req)?;
        question.id = Some(oid);
        self.collection()
            .replace_one(doc! { "_id": oid }, &question)
            .await?;

        let updated = self
            .collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
        Ok(QuestionResponse::from(updated))
    }

    pub async fn delete(&self, question_id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(question_id, "question")?;
        let deleted = self.collection().delete_one(doc! { "_id": oid }).await?;
        if deleted.deleted_count == 0 {
            return Err(ApiError::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    fn collection(&self) -> mongodb::Collection<Question> {
        self.mongo.collection::<Question>("questions")
    }
}

fn build_question(req: CreateQuestionRequest) -> Result<Question, ApiError> {
    req.validate_shape().map_err(ApiError::Validation)?;

    let now = Utc::now();
    Ok(Question {
        id: None,
        question_text_bn: req.question_text_bn,
        question_text_en: req.question_text_en,
        options: req.options,
        passage_bn: req.passage_bn,
        passage_en: req.passage_en,
        sub_questions: req.sub_questions,
        explanation: req.explanation,
        subject_id: parse_object_id(&req.subject_id, "subject")?,
        chapter_id: parse_object_id(&req.chapter_id, "chapter")?,
        topic_id: parse_object_id(&req.topic_id, "topic")?,
        exam_type_id: req
            .exam_type_id
            .as_deref()
            .map(|id| parse_object_id(id, "exam type"))
            .transpose()?,
        question_type: req.question_type.unwrap_or_else(|| "MCQ".to_string()),
        difficulty: req.difficulty.unwrap_or_default(),
        tags: req.tags,
        created_at: now,
        updated_at: now,
    })
}

fn regex_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_input_is_escaped_before_regex() {
        assert_eq!(regex_escape("a+b (c)"), r"a\+b \(c\)");
        assert_eq!(regex_escape("plain"), "plain");
    }
}
