//! Membership domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserPublic;

/// Invitation quota granted to every new membership.
pub const DEFAULT_INVITATION_QUOTA: i32 = 10;

/// A user's standing within a circle.
///
/// At most one row exists per (user, circle) pair. Leaving flips
/// `is_active` to false; the row persists for audit and history, and an
/// inactive membership authorizes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Membership {
    pub id: Uuid,
    pub circle_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub is_active: bool,
    pub invited_by: Option<Uuid>,
    pub remaining_invitations: i32,
    pub used_invitations: i32,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub joined_at: DateTime<Utc>,
}

/// Request to join a circle with an invitation code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinCircleRequest {
    #[validate(length(min = 8, message = "Invitation code must be at least 8 characters"))]
    pub invitation_code: String,
}

/// Member representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberResponse {
    pub user: UserPublic,
    pub is_admin: bool,
    pub is_active: bool,
    pub invited_by: Option<String>,
    pub remaining_invitations: i32,
    pub used_invitations: i32,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub joined_at: DateTime<Utc>,
}

/// Response for listing circle members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListMembersResponse {
    pub data: Vec<MemberResponse>,
    pub pagination: shared::pagination::Pagination,
}

/// A member's invitation pool: who already joined with their codes, and
/// which codes are still outstanding.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationPoolResponse {
    pub used_invitations: Vec<MemberResponse>,
    pub invitations: Vec<String>,
}

/// How many fresh codes a member's pool is missing.
///
/// The pool is lazily topped up until the unused code count matches the
/// member's remaining quota. Over-issuance under concurrent calls is
/// tolerated; unused codes are cheap.
pub fn pool_deficit(remaining_invitations: i32, unused_codes: usize) -> usize {
    (remaining_invitations.max(0) as usize).saturating_sub(unused_codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_deficit() {
        assert_eq!(pool_deficit(10, 0), 10);
        assert_eq!(pool_deficit(10, 4), 6);
        assert_eq!(pool_deficit(10, 10), 0);
        // More outstanding codes than quota is not an error
        assert_eq!(pool_deficit(3, 7), 0);
        // A negative quota is a data-integrity bug; never issue for it
        assert_eq!(pool_deficit(-2, 0), 0);
    }

    #[test]
    fn test_join_request_validation() {
        let ok = JoinCircleRequest {
            invitation_code: "ABCD-EFGH-JKLM".into(),
        };
        assert!(ok.validate().is_ok());

        let short = JoinCircleRequest {
            invitation_code: "ABC".into(),
        };
        assert!(short.validate().is_err());
    }
}
