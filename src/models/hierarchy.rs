//! Content hierarchy documents: Class -> Group -> Subject -> Chapter -> Topic,
//! plus the ExamType classification tags. Each node references its parent by
//! ObjectId; lists are sorted by `order` then creation time.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "classId")]
    pub class_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "groupId")]
    pub group_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "subjectId")]
    pub subject_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "chapterId")]
    pub chapter_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExamCategory {
    Board,
    Admission,
    Institution,
    Practice,
}

/// Past-exam classification tag, unique on (category, name, year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamType {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "examCategory")]
    pub exam_category: ExamCategory,
    #[serde(rename = "examName")]
    pub exam_name: String,
    pub year: i32,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Hierarchy node as returned to clients. One shape serves all five levels;
/// only the parent field relevant to the level is populated.
#[derive(Debug, Serialize)]
pub struct NodeResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "classId", skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(rename = "subjectId", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(rename = "chapterId", skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl NodeResponse {
    fn bare(
        id: Option<ObjectId>,
        name: String,
        description: Option<String>,
        order: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        NodeResponse {
            id: id.map(|id| id.to_hex()).unwrap_or_default(),
            name,
            class_id: None,
            group_id: None,
            subject_id: None,
            chapter_id: None,
            description,
            order,
            created_at,
            updated_at,
        }
    }
}

impl From<Class> for NodeResponse {
    fn from(c: Class) -> Self {
        NodeResponse::bare(c.id, c.name, c.description, c.order, c.created_at, c.updated_at)
    }
}

impl From<Group> for NodeResponse {
    fn from(g: Group) -> Self {
        let mut resp =
            NodeResponse::bare(g.id, g.name, g.description, g.order, g.created_at, g.updated_at);
        resp.class_id = Some(g.class_id.to_hex());
        resp
    }
}

impl From<Subject> for NodeResponse {
    fn from(s: Subject) -> Self {
        let mut resp =
            NodeResponse::bare(s.id, s.name, s.description, s.order, s.created_at, s.updated_at);
        resp.group_id = Some(s.group_id.to_hex());
        resp
    }
}

impl From<Chapter> for NodeResponse {
    fn from(c: Chapter) -> Self {
        let mut resp =
            NodeResponse::bare(c.id, c.name, c.description, c.order, c.created_at, c.updated_at);
        resp.subject_id = Some(c.subject_id.to_hex());
        resp
    }
}

impl From<Topic> for NodeResponse {
    fn from(t: Topic) -> Self {
        let mut resp =
            NodeResponse::bare(t.id, t.name, t.description, t.order, t.created_at, t.updated_at);
        resp.chapter_id = Some(t.chapter_id.to_hex());
        resp
    }
}

#[derive(Debug, Serialize)]
pub struct ExamTypeResponse {
    pub id: String,
    #[serde(rename = "examCategory")]
    pub exam_category: ExamCategory,
    #[serde(rename = "examName")]
    pub exam_name: String,
    pub year: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<ExamType> for ExamTypeResponse {
    fn from(et: ExamType) -> Self {
        ExamTypeResponse {
            id: et.id.map(|id| id.to_hex()).unwrap_or_default(),
            exam_category: et.exam_category,
            exam_name: et.exam_name,
            year: et.year,
            created_at: et.created_at,
            updated_at: et.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNodeRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Parent reference; unused for top-level classes.
    #[serde(
        alias = "classId",
        alias = "groupId",
        alias = "subjectId",
        alias = "chapterId"
    )]
    pub parent_id: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    #[serde(
        alias = "classId",
        alias = "groupId",
        alias = "subjectId",
        alias = "chapterId"
    )]
    pub parent_id: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNodesQuery {
    #[serde(
        alias = "classId",
        alias = "groupId",
        alias = "subjectId",
        alias = "chapterId"
    )]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamTypeRequest {
    #[serde(rename = "examCategory")]
    pub exam_category: ExamCategory,
    #[serde(rename = "examName")]
    #[validate(length(min = 1, message = "Exam name is required"))]
    pub exam_name: String,
    #[validate(range(min = 1950, max = 2100, message = "Year must be between 1950 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExamTypeRequest {
    #[serde(rename = "examCategory")]
    pub exam_category: Option<ExamCategory>,
    #[serde(rename = "examName")]
    pub exam_name: Option<String>,
    pub year: Option<i32>,
}
