//! Rating entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Rating;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the ratings table.
#[derive(Debug, Clone, FromRow)]
pub struct RatingEntity {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub circle_id: Uuid,
    pub rating_user: Uuid,
    pub rated_user: Uuid,
    pub score: i32,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RatingEntity> for Rating {
    fn from(entity: RatingEntity) -> Self {
        Self {
            id: entity.id,
            ride_id: entity.ride_id,
            circle_id: entity.circle_id,
            rating_user: entity.rating_user,
            rated_user: entity.rated_user,
            score: entity.score,
            comments: entity.comments,
            created_at: entity.created_at,
        }
    }
}
