//! Circle domain model and capacity policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::DomainError;

/// A circle is a private group where rides are offered and taken by its
/// members. Joining requires a single-use invitation code issued by an
/// existing member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Circle {
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

/// Checks the capacity-policy field invariant.
///
/// `is_limited=true` requires a positive limit; `is_limited=false` requires
/// the limit to be zero. Enforced at every circle create/update boundary.
pub fn validate_capacity_policy(is_limited: bool, members_limit: i32) -> Result<(), DomainError> {
    match (is_limited, members_limit) {
        (true, limit) if limit <= 0 => Err(DomainError::Validation(
            "Limited circles must declare a positive members limit".into(),
        )),
        (false, limit) if limit != 0 => Err(DomainError::Validation(
            "Unlimited circles must not declare a members limit".into(),
        )),
        _ => Ok(()),
    }
}

/// Capacity check used before admitting a new member.
///
/// Optimistic callers must re-validate under the join transaction; the gap
/// between this check and the membership insert is exploitable otherwise.
pub fn can_accept_member(is_limited: bool, members_limit: i32, active_members: i64) -> bool {
    !is_limited || active_members < members_limit as i64
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Slug may only contain lowercase letters, digits, '-' and '_'".into()))
    }
}

/// Request payload for creating a circle.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCircleRequest {
    #[validate(length(
        min = 1,
        max = 140,
        message = "Name must be between 1 and 140 characters"
    ))]
    pub name: String,

    #[validate(length(min = 1, max = 40, message = "Slug must be between 1 and 40 characters"))]
    #[validate(custom(function = "validate_slug"))]
    pub slug_name: String,

    #[validate(length(max = 255, message = "About must be at most 255 characters"))]
    pub about: Option<String>,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default)]
    pub is_limited: bool,

    #[serde(default)]
    pub members_limit: i32,
}

/// Request payload for updating a circle. Admin only; stats and the
/// verified flag are never client-writable.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateCircleRequest {
    #[validate(length(
        min = 1,
        max = 140,
        message = "Name must be between 1 and 140 characters"
    ))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "About must be at most 255 characters"))]
    pub about: Option<String>,

    pub is_public: Option<bool>,
    pub is_limited: Option<bool>,
    pub members_limit: Option<i32>,
}

/// Circle representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CircleResponse {
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
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Response for listing circles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListCirclesResponse {
    pub data: Vec<CircleResponse>,
    pub pagination: shared::pagination::Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_policy_coherence() {
        assert!(validate_capacity_policy(false, 0).is_ok());
        assert!(validate_capacity_policy(true, 10).is_ok());
        assert!(validate_capacity_policy(true, 0).is_err());
        assert!(validate_capacity_policy(true, -1).is_err());
        assert!(validate_capacity_policy(false, 5).is_err());
    }

    #[test]
    fn test_can_accept_member() {
        // Unlimited circles always accept
        assert!(can_accept_member(false, 0, 1_000_000));
        // Limited circles accept strictly below the limit
        assert!(can_accept_member(true, 3, 2));
        assert!(!can_accept_member(true, 3, 3));
        assert!(!can_accept_member(true, 3, 4));
    }

    #[test]
    fn test_create_circle_request_validation() {
        let valid = CreateCircleRequest {
            name: "Caltech Riders".into(),
            slug_name: "caltech-riders".into(),
            about: None,
            is_public: true,
            is_limited: false,
            members_limit: 0,
        };
        assert!(valid.validate().is_ok());

        let bad_slug = CreateCircleRequest {
            slug_name: "Caltech Riders!".into(),
            ..valid.clone()
        };
        assert!(bad_slug.validate().is_err());

        let long_name = CreateCircleRequest {
            name: "x".repeat(141),
            ..valid
        };
        assert!(long_name.validate().is_err());
    }
}
