use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::error::{is_duplicate_key, parse_object_id, ApiError};
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{
    AuthResponse, LoginRequest, RegisterRequest, User, UserProfile, UserRole, UserStatus,
};

const ACCESS_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 3600;

pub struct AuthService {
    mongo: Database,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(mongo: Database, jwt_service: JwtService) -> Self {
        Self { mongo, jwt_service }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        verify(password, hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))
    }

    /// Self-service registration. Always creates a student; staff accounts
    /// come from the admin surface.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let users = self.mongo.collection::<User>("users");

        let password_hash = self.hash_password(&req.password)?;
        let now = Utc::now();
        let user = User {
            id: None,
            name: req.name,
            email: req.email.trim().to_lowercase(),
            password_hash,
            role: UserRole::Student,
            class_name: None,
            group: None,
            phone: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert_result = users.insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                ApiError::Conflict("User with this email already exists".to_string())
            } else {
                ApiError::from(e)
            }
        })?;

        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Missing inserted user ID")))?;

        let token = self.generate_access_token(&user_id, user.role)?;

        let mut user_with_id = user;
        user_with_id.id = Some(user_id);

        tracing::info!(user_id = %user_id.to_hex(), "New user registered");

        Ok(AuthResponse {
            token,
            user: UserProfile::from(user_with_id),
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        let users = self.mongo.collection::<User>("users");

        let email = req.email.trim().to_lowercase();
        let user = users
            .find_one(doc! { "email": &email })
            .await?
            .ok_or_else(|| ApiError::Authentication("Invalid email or password".to_string()))?;

        if user.status == UserStatus::Inactive {
            return Err(ApiError::Authorization(
                "Your account has been deactivated".to_string(),
            ));
        }

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(email = %email, "Failed login attempt: invalid password");
            return Err(ApiError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let user_id = user
            .id
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User ID not found")))?;

        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "lastLoginAt": mongodb::bson::DateTime::now() } },
            )
            .await?;

        let token = self.generate_access_token(&user_id, user.role)?;

        tracing::info!(user_id = %user_id.to_hex(), "Successful login");

        Ok(AuthResponse {
            token,
            user: UserProfile::from(user),
        })
    }

    /// Profile for the authenticated user, re-read from storage so role and
    /// status changes take effect without a new token.
    pub async fn me(&self, claims: &JwtClaims) -> Result<UserProfile, ApiError> {
        let user_id = parse_object_id(&claims.sub, "user")?;
        let user = self
            .mongo
            .collection::<User>("users")
            .find_one(doc! { "_id": user_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        Ok(UserProfile::from(user))
    }

    fn generate_access_token(
        &self,
        user_id: &ObjectId,
        role: UserRole,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS);

        let claims = JwtClaims {
            sub: user_id.to_hex(),
            role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to generate token: {}", e)))
    }
}
