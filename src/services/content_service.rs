use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Database;
use serde::de::DeserializeOwned;

use crate::error::{is_duplicate_key, parse_object_id, ApiError};
use crate::models::hierarchy::{
    Chapter, Class, CreateExamTypeRequest, CreateNodeRequest, ExamType, ExamTypeResponse, Group,
    ListNodesQuery, NodeResponse, Subject, Topic, UpdateExamTypeRequest, UpdateNodeRequest,
};
use crate::utils::time::chrono_to_bson;

/// Per-level wiring for the shared hierarchy CRUD: collection name, display
/// name, and the parent reference field (none for top-level classes).
pub trait HierarchyLevel: DeserializeOwned + Into<NodeResponse> + Send + Sync {
    const COLLECTION: &'static str;
    const ENTITY: &'static str;
    const PARENT_FIELD: Option<&'static str>;
    const PARENT_ENTITY: &'static str;
}

impl HierarchyLevel for Class {
    const COLLECTION: &'static str = "classes";
    const ENTITY: &'static str = "Class";
    const PARENT_FIELD: Option<&'static str> = None;
    const PARENT_ENTITY: &'static str = "";
}

impl HierarchyLevel for Group {
    const COLLECTION: &'static str = "groups";
    const ENTITY: &'static str = "Group";
    const PARENT_FIELD: Option<&'static str> = Some("classId");
    const PARENT_ENTITY: &'static str = "class";
}

impl HierarchyLevel for Subject {
    const COLLECTION: &'static str = "subjects";
    const ENTITY: &'static str = "Subject";
    const PARENT_FIELD: Option<&'static str> = Some("groupId");
    const PARENT_ENTITY: &'static str = "group";
}

impl HierarchyLevel for Chapter {
    const COLLECTION: &'static str = "chapters";
    const ENTITY: &'static str = "Chapter";
    const PARENT_FIELD: Option<&'static str> = Some("subjectId");
    const PARENT_ENTITY: &'static str = "subject";
}

impl HierarchyLevel for Topic {
    const COLLECTION: &'static str = "topics";
    const ENTITY: &'static str = "Topic";
    const PARENT_FIELD: Option<&'static str> = Some("chapterId");
    const PARENT_ENTITY: &'static str = "chapter";
}

pub struct ContentService {
    mongo: Database,
}

impl ContentService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create_node<T: HierarchyLevel>(
        &self,
        req: CreateNodeRequest,
    ) -> Result<NodeResponse, ApiError> {
        if req.name.trim().is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }

        let now = chrono_to_bson(Utc::now());
        let mut document = doc! {
            "name": req.name.trim(),
            "order": req.order.unwrap_or(0),
            "createdAt": now,
            "updatedAt": now,
        };
        if let Some(description) = req.description {
            document.insert("description", description);
        }
        if let Some(field) = T::PARENT_FIELD {
            let parent = req.parent_id.as_deref().ok_or_else(|| {
                ApiError::Validation(format!(
                    "Please provide a {} for this {}",
                    T::PARENT_ENTITY,
                    T::ENTITY.to_lowercase()
                ))
            })?;
            document.insert(field, parse_object_id(parent, T::PARENT_ENTITY)?);
        }

        let writes = self.mongo.collection::<Document>(T::COLLECTION);
        let insert = writes.insert_one(document).await.map_err(|e| {
            if is_duplicate_key(&e) {
                ApiError::Conflict(format!("{} name already exists", T::ENTITY))
            } else {
                e.into()
            }
        })?;
        let id = insert
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted ID")))?;

        let created = self.find_required::<T>(&id.to_hex()).await?;
        Ok(created.into())
    }

    pub async fn list_nodes<T: HierarchyLevel>(
        &self,
        query: ListNodesQuery,
    ) -> Result<Vec<NodeResponse>, ApiError> {
        let mut filter = Document::new();
        if let (Some(field), Some(parent)) = (T::PARENT_FIELD, query.parent_id.as_deref()) {
            filter.insert(field, parse_object_id(parent, T::PARENT_ENTITY)?);
        }

        let nodes: Vec<T> = self
            .mongo
            .collection::<T>(T::COLLECTION)
            .find(filter)
            .sort(doc! { "order": 1, "createdAt": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(nodes.into_iter().map(Into::into).collect())
    }

    pub async fn get_node<T: HierarchyLevel>(&self, id: &str) -> Result<NodeResponse, ApiError> {
        Ok(self.find_required::<T>(id).await?.into())
    }

    pub async fn update_node<T: HierarchyLevel>(
        &self,
        id: &str,
        req: UpdateNodeRequest,
    ) -> Result<NodeResponse, ApiError> {
        let oid = parse_object_id(id, T::ENTITY)?;
        self.find_required::<T>(id).await?;

        let mut set = doc! { "updatedAt": chrono_to_bson(Utc::now()) };
        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("Name is required".to_string()));
            }
            set.insert("name", name.trim());
        }
        if let Some(description) = req.description {
            set.insert("description", description);
        }
        if let Some(order) = req.order {
            set.insert("order", order);
        }
        if let (Some(field), Some(parent)) = (T::PARENT_FIELD, req.parent_id.as_deref()) {
            set.insert(field, parse_object_id(parent, T::PARENT_ENTITY)?);
        }

        self.mongo
            .collection::<Document>(T::COLLECTION)
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    ApiError::Conflict(format!("{} name already exists", T::ENTITY))
                } else {
                    ApiError::from(e)
                }
            })?;

        Ok(self.find_required::<T>(id).await?.into())
    }

    pub async fn delete_node<T: HierarchyLevel>(&self, id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(id, T::ENTITY)?;
        let deleted = self
            .mongo
            .collection::<Document>(T::COLLECTION)
            .delete_one(doc! { "_id": oid })
            .await?;
        if deleted.deleted_count == 0 {
            return Err(ApiError::NotFound(format!("{} not found", T::ENTITY)));
        }
        Ok(())
    }

    async fn find_required<T: HierarchyLevel>(&self, id: &str) -> Result<T, ApiError> {
        let oid = parse_object_id(id, T::ENTITY)?;
        self.mongo
            .collection::<T>(T::COLLECTION)
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{} not found", T::ENTITY)))
    }

    pub async fn create_exam_type(
        &self,
        req: CreateExamTypeRequest,
    ) -> Result<ExamTypeResponse, ApiError> {
        let now = Utc::now();
        let exam_type = ExamType {
            id: None,
            exam_category: req.exam_category,
            exam_name: req.exam_name.trim().to_string(),
            year: req.year,
            created_at: now,
            updated_at: now,
        };

        let collection = self.exam_types();
        let insert = collection.insert_one(&exam_type).await.map_err(|e| {
            if is_duplicate_key(&e) {
                ApiError::Conflict("Exam type already exists".to_string())
            } else {
                ApiError::from(e)
            }
        })?;
        let id = insert
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted ID")))?;
        let created = collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam type not found".to_string()))?;
        Ok(created.into())
    }

    pub async fn list_exam_types(&self) -> Result<Vec<ExamTypeResponse>, ApiError> {
        let exam_types: Vec<ExamType> = self
            .exam_types()
            .find(doc! {})
            .sort(doc! { "year": -1, "examName": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(exam_types.into_iter().map(Into::into).collect())
    }

    pub async fn update_exam_type(
        &self,
        id: &str,
        req: UpdateExamTypeRequest,
    ) -> Result<ExamTypeResponse, ApiError> {
        let oid = parse_object_id(id, "exam type")?;

        let mut set = doc! { "updatedAt": chrono_to_bson(Utc::now()) };
        if let Some(category) = req.exam_category {
            set.insert(
                "examCategory",
                mongodb::bson::to_bson(&category).map_err(anyhow::Error::new)?,
            );
        }
        if let Some(name) = req.exam_name {
            set.insert("examName", name.trim());
        }
        if let Some(year) = req.year {
            set.insert("year", year);
        }

        self.exam_types()
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    ApiError::Conflict("Exam type already exists".to_string())
                } else {
                    ApiError::from(e)
                }
            })?;

        let updated = self
            .exam_types()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("Exam type not found".to_string()))?;
        Ok(updated.into())
    }

    pub async fn delete_exam_type(&self, id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(id, "exam type")?;
        let deleted = self.exam_types().delete_one(doc! { "_id": oid }).await?;
        if deleted.deleted_count == 0 {
            return Err(ApiError::NotFound("Exam type not found".to_string()));
        }
        Ok(())
    }

    fn exam_types(&self) -> mongodb::Collection<ExamType> {
        self.mongo.collection::<ExamType>("exam_types")
    }
}
