use std::collections::HashMap;

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Bson};
use mongodb::options::ReturnDocument;
use mongodb::Database;

use crate::error::{parse_object_id, ApiError};
use crate::middlewares::auth::JwtClaims;
use crate::models::exam::Exam;
use crate::models::hierarchy::Subject;
use crate::models::result::{
    ExamResult, ResultExamContext, ResultResponse, ResultStudentContext, SubmitResultRequest,
};
use crate::models::user::User;
use crate::utils::time::chrono_to_bson;

pub struct ResultService {
    mongo: Database,
}

impl ResultService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Record a submission. Keyed on (examId, studentId) as an upsert, so a
    /// resubmission replaces the earlier row instead of inserting a second
    /// one; the unique index backs this against concurrent submits.
    pub async fn submit(
        &self,
        claims: &JwtClaims,
        req: SubmitResultRequest,
    ) -> Result<ResultResponse, ApiError> {
        if !req.is_complete() {
            return Err(ApiError::Validation("Missing required fields".to_string()));
        }
        let exam_id = parse_object_id(req.exam_id.as_deref().unwrap_or_default(), "exam")?;
        let student_id = parse_object_id(&claims.sub, "user")?;

        let exam = self
            .mongo
            .collection::<Exam>("exams")
            .find_one(doc! { "_id": exam_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

        if !exam.allows_student(&student_id) {
            return Err(ApiError::Authorization(
                "You are not allowed to attempt this exam".to_string(),
            ));
        }

        let answers = to_bson(&req.answers)
            .map_err(anyhow::Error::new)?
            .as_document()
            .cloned()
            .unwrap_or_default();

        let update = doc! {
            "$set": {
                "answers": Bson::Document(answers),
                "score": req.score,
                "totalMarks": req.total_marks,
                "percentage": req.percentage,
                "timeTaken": req.time_taken,
                "submittedAt": chrono_to_bson(Utc::now()),
            }
        };

        let saved = self
            .collection()
            .find_one_and_update(doc! { "examId": exam_id, "studentId": student_id }, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Result upsert returned nothing")))?;

        Ok(ResultResponse::from(saved))
    }

    /// The requesting student's results, newest first, with exam title and
    /// subject name joined in for display.
    pub async fn my_results(&self, claims: &JwtClaims) -> Result<Vec<ResultResponse>, ApiError> {
        let student_id = parse_object_id(&claims.sub, "user")?;
        let results: Vec<ExamResult> = self
            .collection()
            .find(doc! { "studentId": student_id })
            .sort(doc! { "submittedAt": -1 })
            .await?
            .try_collect()
            .await?;

        let exam_ids: Vec<ObjectId> = results.iter().map(|r| r.exam_id).collect();
        let mut exams: HashMap<ObjectId, Exam> = HashMap::new();
        if !exam_ids.is_empty() {
            let found: Vec<Exam> = self
                .mongo
                .collection::<Exam>("exams")
                .find(doc! { "_id": { "$in": exam_ids } })
                .await?
                .try_collect()
                .await?;
            for exam in found {
                if let Some(id) = exam.id {
                    exams.insert(id, exam);
                }
            }
        }

        let subject_ids: Vec<ObjectId> =
            exams.values().filter_map(|e| e.subject_id).collect();
        let mut subjects: HashMap<ObjectId, String> = HashMap::new();
        if !subject_ids.is_empty() {
            let found: Vec<Subject> = self
                .mongo
                .collection::<Subject>("subjects")
                .find(doc! { "_id": { "$in": subject_ids } })
                .await?
                .try_collect()
                .await?;
            for subject in found {
                if let Some(id) = subject.id {
                    subjects.insert(id, subject.name);
                }
            }
        }

        Ok(results
            .into_iter()
            .map(|result| {
                let context = exams.get(&result.exam_id).map(|exam| ResultExamContext {
                    title: exam.title.clone(),
                    subject_name: exam
                        .subject_id
                        .and_then(|id| subjects.get(&id).cloned()),
                });
                let mut response = ResultResponse::from(result);
                response.exam = context;
                response
            })
            .collect())
    }

    /// Every result for one exam, best score first, with student identity
    /// joined in. Staff-only at the routing layer.
    pub async fn by_exam(&self, exam_id: &str) -> Result<Vec<ResultResponse>, ApiError> {
        let exam_oid = parse_object_id(exam_id, "exam")?;
        let results: Vec<ExamResult> = self
            .collection()
            .find(doc! { "examId": exam_oid })
            .sort(doc! { "score": -1 })
            .await?
            .try_collect()
            .await?;

        let student_ids: Vec<ObjectId> = results.iter().map(|r| r.student_id).collect();
        let mut students: HashMap<ObjectId, ResultStudentContext> = HashMap::new();
        if !student_ids.is_empty() {
            let found: Vec<User> = self
                .mongo
                .collection::<User>("users")
                .find(doc! { "_id": { "$in": student_ids } })
                .await?
                .try_collect()
                .await?;
            for user in found {
                if let Some(id) = user.id {
                    students.insert(
                        id,
                        ResultStudentContext {
                            name: user.name,
                            email: user.email,
                        },
                    );
                }
            }
        }

        Ok(results
            .into_iter()
            .map(|result| {
                let student = students.remove(&result.student_id);
                let mut response = ResultResponse::from(result);
                response.student = student;
                response
            })
            .collect())
    }

    fn collection(&self) -> mongodb::Collection<ExamResult> {
        self.mongo.collection::<ExamResult>("exam_results")
    }
}
