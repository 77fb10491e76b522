//! Rating domain model and reputation rounding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// A 1-5 score with an optional comment, authored by a passenger about the
/// ride owner. One per (ride, rating_user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Rating {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub circle_id: Uuid,
    pub rating_user: Uuid,
    pub rated_user: Uuid,
    pub score: i32,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for rating a ride.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RateRideRequest {
    pub score: i32,

    #[validate(length(max = 500, message = "Comments must be at most 500 characters"))]
    pub comments: Option<String>,
}

/// Response after submitting a rating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RatingResponse {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub score: i32,
    pub comments: Option<String>,
    pub ride_rating: f64,
    pub rated_user_reputation: f64,
    pub created_at: DateTime<Utc>,
}

/// Checks the admitted score range.
pub fn validate_score(score: i32) -> Result<(), DomainError> {
    if !(1..=5).contains(&score) {
        return Err(DomainError::InvalidScore);
    }
    Ok(())
}

/// Round a rating mean half-up to one decimal.
pub fn round_mean(mean: f64) -> f64 {
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
        assert!(matches!(validate_score(0), Err(DomainError::InvalidScore)));
        assert!(matches!(validate_score(6), Err(DomainError::InvalidScore)));
    }

    #[test]
    fn test_round_mean_half_up() {
        // {3, 5} -> 4.0
        assert_eq!(round_mean(4.0), 4.0);
        // {4, 5, 5} -> 4.666... -> 4.7
        assert_eq!(round_mean(14.0 / 3.0), 4.7);
        // Exact half rounds up
        assert_eq!(round_mean(4.65), 4.7);
        assert_eq!(round_mean(3.24), 3.2);
    }
}
