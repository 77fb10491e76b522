//! Ride domain model and lifecycle rules.
//!
//! A ride moves from scheduled, through an implicit departed phase derived
//! from the clock, to finished (`is_active=false`). "Departed" is never
//! stored; it is recomputed from `departure_date` at read time and at every
//! state-changing operation so it cannot desync from wall-clock time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserPublic;
use crate::error::DomainError;

/// Minimum lead time between "now" and a ride's departure, for both
/// creation and the joinable listing.
pub const MIN_DEPARTURE_LEAD_MINUTES: i64 = 10;

/// Maximum seats a ride can offer at creation.
pub const MAX_AVAILABLE_SEATS: i32 = 10;

/// A trip offered inside exactly one circle by exactly one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ride {
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

impl Ride {
    /// Whether the ride's departure time has passed.
    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_date <= now
    }

    /// Whether the ride should appear in the joinable listing.
    pub fn is_joinable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.available_seats >= 1
            && self.departure_date >= now + Duration::minutes(MIN_DEPARTURE_LEAD_MINUTES)
    }

    /// Full eligibility check for a join attempt.
    ///
    /// `is_passenger` is the caller's pre-read of the passenger set; the
    /// persistence layer re-checks it with a uniqueness constraint inside
    /// the join transaction.
    pub fn check_joinable_by(
        &self,
        user_id: Uuid,
        is_passenger: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::RideNotJoinable(
                "the ride has already finished".into(),
            ));
        }
        if self.has_departed(now) {
            return Err(DomainError::RideNotJoinable(
                "the ride has already departed".into(),
            ));
        }
        if self.available_seats < 1 {
            return Err(DomainError::RideNotJoinable(
                "there is no room in this ride".into(),
            ));
        }
        if self.offered_by == user_id {
            return Err(DomainError::RideNotJoinable(
                "the ride owner cannot be a passenger".into(),
            ));
        }
        if is_passenger {
            return Err(DomainError::RideNotJoinable(
                "the user already joined this ride".into(),
            ));
        }
        Ok(())
    }

    /// Field updates are rejected once the ride has departed.
    pub fn check_updatable(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.has_departed(now) {
            return Err(DomainError::RideLocked);
        }
        Ok(())
    }

    /// The owner may finish a ride only after it has departed. Finishing an
    /// already-finished ride is a no-op, which makes the flip idempotent
    /// under concurrent finish/expire calls.
    pub fn check_finishable(&self, owner: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.offered_by != owner {
            return Err(DomainError::NotRideOwner);
        }
        if !self.has_departed(now) {
            return Err(DomainError::RideNotStarted);
        }
        Ok(())
    }
}

/// Validates the schedule of a new ride against "now".
pub fn validate_schedule(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let min_departure = now + Duration::minutes(MIN_DEPARTURE_LEAD_MINUTES);
    if departure < min_departure {
        return Err(DomainError::Validation(format!(
            "Departure time must be at least {} minutes in the future",
            MIN_DEPARTURE_LEAD_MINUTES
        )));
    }
    if arrival <= departure {
        return Err(DomainError::Validation(
            "Arrival time has to happen after the departure".into(),
        ));
    }
    Ok(())
}

/// Request payload for offering a ride.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRideRequest {
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,

    #[validate(length(min = 1, max = 255, message = "Departure location is required"))]
    pub departure_location: String,

    #[validate(length(min = 1, max = 255, message = "Arrival location is required"))]
    pub arrival_location: String,

    #[validate(range(min = 1, max = 10, message = "Available seats must be between 1 and 10"))]
    pub available_seats: i32,
}

/// Request payload for updating a ride before departure.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateRideRequest {
    pub departure_date: Option<DateTime<Utc>>,
    pub arrival_date: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 255, message = "Departure location must not be empty"))]
    pub departure_location: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Arrival location must not be empty"))]
    pub arrival_location: Option<String>,
}

/// Ride representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RideResponse {
    pub id: Uuid,
    pub offered_by: UserPublic,
    pub offered_in: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_location: String,
    pub available_seats: i32,
    pub passengers: Vec<UserPublic>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Response for the joinable-rides listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRidesResponse {
    pub data: Vec<RideResponse>,
    pub pagination: shared::pagination::Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_ride(now: DateTime<Utc>) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            offered_by: Uuid::new_v4(),
            offered_in: Uuid::new_v4(),
            departure_date: now + Duration::hours(1),
            arrival_date: now + Duration::hours(2),
            departure_location: "Campus".into(),
            arrival_location: "Downtown".into(),
            available_seats: 2,
            rating: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_schedule_lead_time() {
        let now = base_now();
        // 9 minutes out: too soon
        assert!(validate_schedule(
            now + Duration::minutes(9),
            now + Duration::hours(1),
            now
        )
        .is_err());
        // Exactly at the lead time boundary is allowed
        assert!(validate_schedule(
            now + Duration::minutes(10),
            now + Duration::hours(1),
            now
        )
        .is_ok());
    }

    #[test]
    fn test_validate_schedule_ordering() {
        let now = base_now();
        let departure = now + Duration::hours(1);
        assert!(validate_schedule(departure, departure, now).is_err());
        assert!(validate_schedule(departure, departure - Duration::minutes(1), now).is_err());
        assert!(validate_schedule(departure, departure + Duration::minutes(1), now).is_ok());
    }

    #[test]
    fn test_join_eligibility_happy_path() {
        let now = base_now();
        let ride = sample_ride(now);
        assert!(ride.check_joinable_by(Uuid::new_v4(), false, now).is_ok());
    }

    #[test]
    fn test_join_rejected_after_departure() {
        let now = base_now();
        let ride = sample_ride(now);
        let later = ride.departure_date + Duration::minutes(1);
        assert!(matches!(
            ride.check_joinable_by(Uuid::new_v4(), false, later),
            Err(DomainError::RideNotJoinable(_))
        ));
    }

    #[test]
    fn test_join_rejected_when_full() {
        let now = base_now();
        let mut ride = sample_ride(now);
        ride.available_seats = 0;
        assert!(matches!(
            ride.check_joinable_by(Uuid::new_v4(), false, now),
            Err(DomainError::RideNotJoinable(_))
        ));
    }

    #[test]
    fn test_owner_cannot_join_own_ride() {
        let now = base_now();
        let ride = sample_ride(now);
        assert!(ride.check_joinable_by(ride.offered_by, false, now).is_err());
    }

    #[test]
    fn test_existing_passenger_cannot_rejoin() {
        let now = base_now();
        let ride = sample_ride(now);
        assert!(ride.check_joinable_by(Uuid::new_v4(), true, now).is_err());
    }

    #[test]
    fn test_finished_ride_not_joinable() {
        let now = base_now();
        let mut ride = sample_ride(now);
        ride.is_active = false;
        assert!(ride.check_joinable_by(Uuid::new_v4(), false, now).is_err());
        assert!(!ride.is_joinable(now));
    }

    #[test]
    fn test_joinable_listing_window() {
        let now = base_now();
        let mut ride = sample_ride(now);
        assert!(ride.is_joinable(now));

        // Departing within the lead window drops out of the listing
        ride.departure_date = now + Duration::minutes(5);
        assert!(!ride.is_joinable(now));
    }

    #[test]
    fn test_update_locked_after_departure() {
        let now = base_now();
        let ride = sample_ride(now);
        assert!(ride.check_updatable(now).is_ok());
        assert!(matches!(
            ride.check_updatable(ride.departure_date),
            Err(DomainError::RideLocked)
        ));
    }

    #[test]
    fn test_finish_rules() {
        let now = base_now();
        let ride = sample_ride(now);
        let stranger = Uuid::new_v4();

        assert!(matches!(
            ride.check_finishable(stranger, now),
            Err(DomainError::NotRideOwner)
        ));
        assert!(matches!(
            ride.check_finishable(ride.offered_by, now),
            Err(DomainError::RideNotStarted)
        ));
        assert!(ride
            .check_finishable(ride.offered_by, ride.departure_date + Duration::minutes(1))
            .is_ok());
    }
}
