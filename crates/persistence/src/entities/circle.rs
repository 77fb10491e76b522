//! Circle entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::circle::CircleResponse;
use domain::models::Circle;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the circles table.
#[derive(Debug, Clone, FromRow)]
pub struct CircleEntity {
    pub id: Uuid,
    pub name: String,
    pub slug_name: String,
    pub about: Option<String>,
    pub rides_offered: i32,
    pub rides_taken: i32,
    pub verified: bool,
    pub is_public: bool,
    pub is_limited: bool,
    pub members_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CircleEntity> for Circle {
    fn from(entity: CircleEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug_name: entity.slug_name,
            about: entity.about,
            rides_offered: entity.rides_offered,
            rides_taken: entity.rides_taken,
            verified: entity.verified,
            is_public: entity.is_public,
            is_limited: entity.is_limited,
            members_limit: entity.members_limit,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Circle row joined with its active member count.
#[derive(Debug, Clone, FromRow)]
pub struct CircleWithCountEntity {
    pub id: Uuid,
    pub name: String,
    pub slug_name: String,
    pub about: Option<String>,
    pub rides_offered: i32,
    pub rides_taken: i32,
    pub verified: bool,
    pub is_public: bool,
    pub is_limited: bool,
    pub members_limit: i32,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

impl From<CircleWithCountEntity> for CircleResponse {
    fn from(entity: CircleWithCountEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug_name: entity.slug_name,
            about: entity.about,
            rides_offered: entity.rides_offered,
            rides_taken: entity.rides_taken,
            verified: entity.verified,
            is_public: entity.is_public,
            is_limited: entity.is_limited,
            members_limit: entity.members_limit,
            member_count: entity.member_count,
            created_at: entity.created_at,
        }
    }
}
