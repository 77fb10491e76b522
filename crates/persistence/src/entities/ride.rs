//! Ride entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::Ride;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the rides table.
#[derive(Debug, Clone, FromRow)]
pub struct RideEntity {
    pub id: Uuid,
    pub offered_by: Uuid,
    pub offered_in: Uuid,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_location: String,
    pub available_seats: i32,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RideEntity> for Ride {
    fn from(entity: RideEntity) -> Self {
        Self {
            id: entity.id,
            offered_by: entity.offered_by,
            offered_in: entity.offered_in,
            departure_date: entity.departure_date,
            arrival_date: entity.arrival_date,
            departure_location: entity.departure_location,
            arrival_location: entity.arrival_location,
            available_seats: entity.available_seats,
            rating: entity.rating,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Ride row joined with the owner's public info and the circle slug.
#[derive(Debug, Clone, FromRow)]
pub struct RideWithOwnerEntity {
    pub id: Uuid,
    pub offered_by: Uuid,
    pub offered_in: Uuid,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_location: String,
    pub available_seats: i32,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Circle info
    pub circle_slug: String,
    // Owner info
    pub owner_username: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_reputation: f64,
    pub owner_rides_taken: i32,
    pub owner_rides_offered: i32,
}

impl RideWithOwnerEntity {
    /// The plain ride portion of the joined row.
    pub fn ride(&self) -> Ride {
        Ride {
            id: self.id,
            offered_by: self.offered_by,
            offered_in: self.offered_in,
            departure_date: self.departure_date,
            arrival_date: self.arrival_date,
            departure_location: self.departure_location.clone(),
            arrival_location: self.arrival_location.clone(),
            available_seats: self.available_seats,
            rating: self.rating,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
