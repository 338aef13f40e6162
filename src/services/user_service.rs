use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document, Regex};
use mongodb::Database;

use crate::error::{is_duplicate_key, parse_object_id, ApiError};
use crate::models::user::{
    CreateUserRequest, ListUsersQuery, UpdateUserRequest, User, UserProfile, UserRole, UserStatus,
};
use crate::services::auth_service::AuthService;
use crate::utils::time::chrono_to_bson;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Admin-facing account management.
pub struct UserService {
    mongo: Database,
}

impl UserService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn create(
        &self,
        auth: &AuthService,
        req: CreateUserRequest,
    ) -> Result<UserProfile, ApiError> {
        let password_hash = auth.hash_password(&req.password)?;
        let now = Utc::now();
        let user = User {
            id: None,
            name: req.name,
            email: req.email.trim().to_lowercase(),
            password_hash,
            role: req.role.unwrap_or_default(),
            class_name: req.class_name,
            group: req.group,
            phone: req.phone,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert = self.collection().insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                ApiError::Conflict("User with this email already exists".to_string())
            } else {
                ApiError::from(e)
            }
        })?;
        let id = insert
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted user ID")))?;

        let mut created = user;
        created.id = Some(id);
        Ok(UserProfile::from(created))
    }

    /// Filtered, paginated listing. `search` matches name or email; explicit
    /// name/email filters narrow further.
    pub async fn list(&self, query: ListUsersQuery) -> Result<(Vec<UserProfile>, u64), ApiError> {
        let mut filter = Document::new();
        if let Some(role) = query.role.as_deref() {
            filter.insert("role", role);
        }
        if let Some(status) = query.status.as_deref() {
            filter.insert("status", status);
        }
        if let Some(class_name) = query.class_name.as_deref() {
            filter.insert("class", class_name);
        }
        if let Some(name) = query.name.as_deref() {
            filter.insert("name", contains_regex(name));
        }
        if let Some(email) = query.email.as_deref() {
            filter.insert("email", contains_regex(email));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            filter.insert(
                "$or",
                vec![
                    doc! { "name": contains_regex(search) },
                    doc! { "email": contains_regex(search) },
                ],
            );
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let skip = (page - 1) as u64 * limit as u64;

        let collection = self.collection();
        let total = collection.count_documents(filter.clone()).await?;
        let users: Vec<User> = collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((users.into_iter().map(UserProfile::from).collect(), total))
    }

    pub async fn get(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        Ok(UserProfile::from(self.find_required(user_id).await?))
    }

    pub async fn update(
        &self,
        user_id: &str,
        req: UpdateUserRequest,
    ) -> Result<UserProfile, ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        self.find_required(user_id).await?;

        let mut set = doc! { "updatedAt": chrono_to_bson(Utc::now()) };
        if let Some(name) = req.name {
            set.insert("name", name);
        }
        if let Some(email) = req.email {
            set.insert("email", email.trim().to_lowercase());
        }
        if let Some(role) = req.role {
            set.insert("role", role.as_str());
        }
        if let Some(class_name) = req.class_name {
            set.insert("class", class_name);
        }
        if let Some(group) = req.group {
            set.insert("group", group);
        }
        if let Some(phone) = req.phone {
            set.insert("phone", phone);
        }
        if let Some(status) = req.status {
            set.insert("status", to_bson(&status).map_err(anyhow::Error::new)?);
        }

        self.collection()
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    ApiError::Conflict("User with this email already exists".to_string())
                } else {
                    ApiError::from(e)
                }
            })?;

        Ok(UserProfile::from(self.find_required(user_id).await?))
    }

    pub async fn change_role(&self, user_id: &str, role: UserRole) -> Result<UserProfile, ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        self.find_required(user_id).await?;
        self.collection()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "role": role.as_str(),
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await?;
        Ok(UserProfile::from(self.find_required(user_id).await?))
    }

    pub async fn change_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<UserProfile, ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        self.find_required(user_id).await?;
        self.collection()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "status": to_bson(&status).map_err(anyhow::Error::new)?,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await?;
        Ok(UserProfile::from(self.find_required(user_id).await?))
    }

    pub async fn reset_password(
        &self,
        auth: &AuthService,
        user_id: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        self.find_required(user_id).await?;

        let password_hash = auth.hash_password(password)?;
        self.collection()
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "password_hash": password_hash,
                    "updatedAt": chrono_to_bson(Utc::now()),
                } },
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        let deleted = self.collection().delete_one(doc! { "_id": oid }).await?;
        if deleted.deleted_count == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn find_required(&self, user_id: &str) -> Result<User, ApiError> {
        let oid = parse_object_id(user_id, "user")?;
        self.collection()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    fn collection(&self) -> mongodb::Collection<User> {
        self.mongo.collection::<User>("users")
    }
}

fn contains_regex(input: &str) -> Regex {
    let mut pattern = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    Regex {
        pattern,
        options: "i".to_string(),
    }
}
