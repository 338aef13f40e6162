use std::collections::HashMap;

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Document};
use mongodb::Database;

use crate::error::{parse_object_id, ApiError};
use crate::middlewares::auth::JwtClaims;
use crate::models::exam::{
    CreateExamRequest, Exam, ExamResponse, ExamStatus, UpdateExamRequest,
};
use crate::models::question::{Question, QuestionResponse};
use crate::models::result::ExamResult;
use crate::services::exam_status::{derive_user_status, exam_start};
use crate::utils::time::{chrono_to_bson, parse_schedule_date};

pub struct ExamService {
    mongo: Database,
}

impl ExamService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create(
        &self,
        claims: &JwtClaims,
        req: CreateExamRequest,
    ) -> Result<ExamResponse, ApiError> {
        let (title, duration, total_marks) = match (req.title, req.duration, req.total_marks) {
            (Some(t), Some(d), Some(m)) if !t.trim().is_empty() => (t, d, m),
            _ => {
                return Err(ApiError::Validation(
                    "Please provide title, duration, and totalMarks".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let mut exam = Exam::new(title, duration, total_marks, now);

        exam.question_ids = parse_id_list(&req.question_ids)?;
        exam.description = req.description;
        exam.instructions = req.instructions;
        exam.warnings = req.warnings;
        exam.syllabus = req.syllabus;
        exam.start_date = parse_optional_date(req.start_date.as_deref(), "startDate")?;
        exam.start_time = req.start_time;
        exam.end_date = parse_optional_date(req.end_date.as_deref(), "endDate")?;
        exam.end_time = req.end_time;
        if let Some(v) = req.marks_per_question {
            exam.marks_per_question = v;
        }
        if let Some(v) = req.negative_marking {
            exam.negative_marking = v;
        }
        if let Some(v) = req.negative_mark_value {
            exam.negative_mark_value = v;
        }
        if let Some(v) = req.question_numbering {
            exam.question_numbering = v;
        }
        if let Some(v) = req.question_presentation {
            exam.question_presentation = v;
        }
        if let Some(v) = req.shuffle_questions {
            exam.shuffle_questions = v;
        }
        if let Some(v) = req.shuffle_options {
            exam.shuffle_options = v;
        }
        if let Some(v) = req.allow_multiple_attempts {
            exam.allow_multiple_attempts = v;
        }
        if let Some(v) = req.allow_answer_change {
            exam.allow_answer_change = v;
        }
        if let Some(v) = req.result_visibility {
            exam.result_visibility = v;
        }
        if let Some(v) = req.answer_visibility {
            exam.answer_visibility = v;
        }
        if let Some(v) = req.auto_submit {
            exam.auto_submit = v;
        }
        if let Some(v) = req.access_type {
            exam.access_type = v;
        }
        if let Some(ids) = req.allowed_students {
            exam.allowed_students = ids;
        }
        exam.class_id = parse_optional_id(req.class_id.as_deref(), "class")?;
        exam.group_id = parse_optional_id(req.group_id.as_deref(), "group")?;
        exam.subject_id = parse_optional_id(req.subject_id.as_deref(), "subject")?;
        exam.chapter_id = parse_optional_id(req.chapter_id.as_deref(), "chapter")?;
        exam.topic_id = parse_optional_id(req.topic_id.as_deref(), "topic")?;
        exam.created_by = Some(parse_object_id(&claims.sub, "user")?);

        // Authored with a future start instant -> scheduled, else draft.
        if exam_start(&exam).is_some_and(|start| start > now) {
            exam.status = ExamStatus::Scheduled;
        }

        let collection = self.collection();
        let insert_result = collection.insert_one(&exam).await?;
        let exam_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted exam ID")))?;

        let created = collection
            .find_one(doc! { "_id": exam_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

        Ok(self.populate(created).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<ExamResponse>, ApiError> {
        let exams: Vec<Exam> = self
            .collection()
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        self.populate_all(exams).await
    }

    pub async fn get(&self, exam_id: &str) -> Result<ExamResponse, ApiError> {
        let oid = parse_object_id(exam_id, "exam")?;
        let exam = self.find_required(oid).await?;
        Ok(self.populate(exam).await?)
    }

    /// Visibility-filtered, status-annotated catalog for the requesting
    /// identity. Staff see everything without annotation; a student sees
    /// open-access exams plus those that list them, each labeled
    /// upcoming/live/previous.
    pub async fn my_exams(&self, claims: &JwtClaims) -> Result<Vec<ExamResponse>, ApiError> {
        if claims.role.is_staff() {
            return self.list_all().await;
        }

        let student_id = parse_object_id(&claims.sub, "user")?;
        let exams: Vec<Exam> = self
            .collection()
            .find(doc! {
                "$or": [
                    { "accessType": { "$ne": "specific" } },
                    { "allowedStudents": student_id },
                ]
            })
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;

        // One query for the student's results; completion wins over timing.
        let results = self.mongo.collection::<ExamResult>("exam_results");
        let completed: Vec<ExamResult> = results
            .find(doc! { "studentId": student_id })
            .await?
            .try_collect()
            .await?;
        let completed_ids: std::collections::HashSet<ObjectId> =
            completed.iter().map(|r| r.exam_id).collect();

        let now = Utc::now();
        let statuses: Vec<_> = exams
            .iter()
            .map(|exam| {
                let done = exam.id.map(|id| completed_ids.contains(&id)).unwrap_or(false);
                derive_user_status(exam, now, done)
            })
            .collect();

        let mut responses = self.populate_all(exams).await?;
        for (response, status) in responses.iter_mut().zip(statuses) {
            response.user_status = Some(status);
        }
        Ok(responses)
    }

    pub async fn update(
        &self,
        exam_id: &str,
        req: UpdateExamRequest,
    ) -> Result<ExamResponse, ApiError> {
        let oid = parse_object_id(exam_id, "exam")?;
        self.find_required(oid).await?;

        let set_doc = build_set_document(req)?;
        if !set_doc.is_empty() {
            self.collection()
                .update_one(doc! { "_id": oid }, doc! { "$set": set_doc })
                .await?;
        }

        let updated = self.find_required(oid).await?;
        Ok(self.populate(updated).await?)
    }

    pub async fn publish(&self, exam_id: &str) -> Result<ExamResponse, ApiError> {
        let oid = parse_object_id(exam_id, "exam")?;
        let exam = self.find_required(oid).await?;

        if exam.question_ids.is_empty() {
            return Err(ApiError::Validation(
                "Cannot publish exam without questions".to_string(),
            ));
        }

        self.collection()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "status": ExamStatus::Live.as_str(),
                    "publishedAt": chrono_to_bson(Utc::now()),
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await?;

        let updated = self.find_required(oid).await?;
        Ok(self.populate(updated).await?)
    }

    pub async fn unpublish(&self, exam_id: &str) -> Result<ExamResponse, ApiError> {
        let oid = parse_object_id(exam_id, "exam")?;
        self.find_required(oid).await?;

        self.collection()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "status": ExamStatus::Draft.as_str(),
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await?;

        let updated = self.find_required(oid).await?;
        Ok(self.populate(updated).await?)
    }

    /// Delete the exam, then cascade-delete its results. The cascade is
    /// best-effort: the exam deletion is authoritative, a failed cascade is
    /// logged and leaves orphaned rows for a later sweep.
    pub async fn delete(&self, exam_id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(exam_id, "exam")?;

        let deleted = self
            .collection()
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

        let results = self.mongo.collection::<ExamResult>("exam_results");
        match results.delete_many(doc! { "examId": oid }).await {
            Ok(outcome) => {
                tracing::info!(
                    "Deleted {} result(s) for exam {}",
                    outcome.deleted_count,
                    oid.to_hex()
                );
            }
            Err(e) => {
                tracing::error!(
                    "Failed to cascade-delete results for exam {} ({}): {}",
                    oid.to_hex(),
                    deleted.title,
                    e
                );
            }
        }

        Ok(())
    }

    fn collection(&self) -> mongodb::Collection<Exam> {
        self.mongo.collection::<Exam>("exams")
    }

    async fn find_required(&self, oid: ObjectId) -> Result<Exam, ApiError> {
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
    }

    async fn populate(&self, exam: Exam) -> Result<ExamResponse, ApiError> {
        Ok(self.populate_all(vec![exam]).await?.remove(0))
    }

    /// Batch question join: one `$in` query for every referenced question,
    /// then distribute per exam preserving composition order.
    async fn populate_all(&self, exams: Vec<Exam>) -> Result<Vec<ExamResponse>, ApiError> {
        let all_ids: Vec<ObjectId> = exams
            .iter()
            .flat_map(|e| e.question_ids.iter().copied())
            .collect();

        let mut by_id: HashMap<ObjectId, Question> = HashMap::new();
        if !all_ids.is_empty() {
            let questions = self.mongo.collection::<Question>("questions");
            let found: Vec<Question> = questions
                .find(doc! { "_id": { "$in": all_ids } })
                .await?
                .try_collect()
                .await?;
            for q in found {
                if let Some(id) = q.id {
                    by_id.insert(id, q);
                }
            }
        }

        Ok(exams
            .into_iter()
            .map(|exam| {
                let questions: Vec<QuestionResponse> = exam
                    .question_ids
                    .iter()
                    .filter_map(|id| by_id.get(id).cloned())
                    .map(QuestionResponse::from)
                    .collect();
                let mut response = ExamResponse::from(exam);
                response.questions = Some(questions);
                response
            })
            .collect())
    }
}

fn parse_id_list(ids: &[String]) -> Result<Vec<ObjectId>, ApiError> {
    ids.iter()
        .map(|id| parse_object_id(id, "question"))
        .collect()
}

fn parse_optional_id(id: Option<&str>, entity: &str) -> Result<Option<ObjectId>, ApiError> {
    id.map(|id| parse_object_id(id, entity)).transpose()
}

fn parse_optional_date(
    value: Option<&str>,
    field: &str,
) -> Result<Option<chrono::DateTime<Utc>>, ApiError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_schedule_date(s)
            .map(Some)
            .ok_or_else(|| ApiError::Validation(format!("Invalid {} value", field))),
    }
}

/// Full-document merge: every provided field lands in one `$set`.
fn build_set_document(req: UpdateExamRequest) -> Result<Document, ApiError> {
    let mut set = doc! { "updatedAt": chrono_to_bson(Utc::now()) };

    if let Some(title) = req.title {
        set.insert("title", title);
    }
    if let Some(duration) = req.duration {
        set.insert("duration", duration);
    }
    if let Some(total_marks) = req.total_marks {
        set.insert("totalMarks", total_marks);
    }
    if let Some(question_ids) = req.question_ids {
        set.insert("questionIds", parse_id_list(&question_ids)?);
    }
    if let Some(status) = req.status {
        set.insert("status", status.as_str());
    }
    if let Some(description) = req.description {
        set.insert("description", description);
    }
    if let Some(instructions) = req.instructions {
        set.insert("instructions", instructions);
    }
    if let Some(warnings) = req.warnings {
        set.insert("warnings", warnings);
    }
    if let Some(syllabus) = req.syllabus {
        set.insert("syllabus", syllabus);
    }
    if let Some(date) = parse_optional_date(req.start_date.as_deref(), "startDate")? {
        set.insert("startDate", chrono_to_bson(date));
    }
    if let Some(start_time) = req.start_time {
        set.insert("startTime", start_time);
    }
    if let Some(date) = parse_optional_date(req.end_date.as_deref(), "endDate")? {
        set.insert("endDate", chrono_to_bson(date));
    }
    if let Some(end_time) = req.end_time {
        set.insert("endTime", end_time);
    }
    if let Some(v) = req.marks_per_question {
        set.insert("marksPerQuestion", v);
    }
    if let Some(v) = req.negative_marking {
        set.insert("negativeMarking", v);
    }
    if let Some(v) = req.negative_mark_value {
        set.insert("negativeMarkValue", v);
    }
    if let Some(v) = req.question_numbering {
        set.insert("questionNumbering", to_bson(&v).map_err(anyhow::Error::new)?);
    }
    if let Some(v) = req.question_presentation {
        set.insert("questionPresentation", to_bson(&v).map_err(anyhow::Error::new)?);
    }
    if let Some(v) = req.shuffle_questions {
        set.insert("shuffleQuestions", v);
    }
    if let Some(v) = req.shuffle_options {
        set.insert("shuffleOptions", v);
    }
    if let Some(v) = req.allow_multiple_attempts {
        set.insert("allowMultipleAttempts", v);
    }
    if let Some(v) = req.allow_answer_change {
        set.insert("allowAnswerChange", v);
    }
    if let Some(v) = req.result_visibility {
        set.insert("resultVisibility", to_bson(&v).map_err(anyhow::Error::new)?);
    }
    if let Some(v) = req.answer_visibility {
        set.insert("answerVisibility", to_bson(&v).map_err(anyhow::Error::new)?);
    }
    if let Some(v) = req.auto_submit {
        set.insert("autoSubmit", v);
    }
    if let Some(v) = req.access_type {
        set.insert("accessType", to_bson(&v).map_err(anyhow::Error::new)?);
    }
    if let Some(ids) = req.allowed_students {
        set.insert("allowedStudents", ids);
    }
    if let Some(id) = parse_optional_id(req.class_id.as_deref(), "class")? {
        set.insert("classId", id);
    }
    if let Some(id) = parse_optional_id(req.group_id.as_deref(), "group")? {
        set.insert("groupId", id);
    }
    if let Some(id) = parse_optional_id(req.subject_id.as_deref(), "subject")? {
        set.insert("subjectId", id);
    }
    if let Some(id) = parse_optional_id(req.chapter_id.as_deref(), "chapter")? {
        set.insert("chapterId", id);
    }
    if let Some(id) = parse_optional_id(req.topic_id.as_deref(), "topic")? {
        set.insert("topicId", id);
    }

    Ok(set)
}
