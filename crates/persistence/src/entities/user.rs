//! User and profile entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::user::{ProfileInfo, UserPublic, UserResponse};
use sqlx::FromRow;
use uuid::Uuid;

/// Joined row mapping for users with their profile.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithProfileEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    // Profile info
    pub biography: Option<String>,
    pub reputation: f64,
    pub rides_taken: i32,
    pub rides_offered: i32,
}

impl From<UserWithProfileEntity> for UserResponse {
    fn from(entity: UserWithProfileEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            first_name: entity.first_name,
            last_name: entity.last_name,
            is_verified: entity.is_verified,
            profile: ProfileInfo {
                biography: entity.biography,
                reputation: entity.reputation,
                rides_taken: entity.rides_taken,
                rides_offered: entity.rides_offered,
            },
            created_at: entity.created_at,
        }
    }
}

/// Public user projection embedded in member and ride rows.
#[derive(Debug, Clone, FromRow)]
pub struct UserPublicEntity {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub reputation: f64,
    pub rides_taken: i32,
    pub rides_offered: i32,
}

impl From<UserPublicEntity> for UserPublic {
    fn from(entity: UserPublicEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            first_name: entity.first_name,
            last_name: entity.last_name,
            reputation: entity.reputation,
            rides_taken: entity.rides_taken,
            rides_offered: entity.rides_offered,
        }
    }
}

/// Credentials row used only by the login handler.
#[derive(Debug, Clone, FromRow)]
pub struct UserAuthEntity {
    pub id: Uuid,
    pub password_hash: String,
}
