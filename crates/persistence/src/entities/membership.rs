//! Membership entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::membership::MemberResponse;
use domain::models::user::UserPublic;
use domain::models::Membership;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the memberships table.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipEntity {
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

impl From<MembershipEntity> for Membership {
    fn from(entity: MembershipEntity) -> Self {
        Self {
            id: entity.id,
            circle_id: entity.circle_id,
            user_id: entity.user_id,
            is_admin: entity.is_admin,
            is_active: entity.is_active,
            invited_by: entity.invited_by,
            remaining_invitations: entity.remaining_invitations,
            used_invitations: entity.used_invitations,
            rides_taken: entity.rides_taken,
            rides_offered: entity.rides_offered,
            joined_at: entity.joined_at,
        }
    }
}

/// Membership joined with the member's user, profile and inviter username.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserEntity {
    pub is_admin: bool,
    pub is_active: bool,
    pub remaining_invitations: i32,
    pub used_invitations: i32,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub joined_at: DateTime<Utc>,
    // User info
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub reputation: f64,
    pub profile_rides_taken: i32,
    pub profile_rides_offered: i32,
    // Inviter info
    pub invited_by_username: Option<String>,
}

impl From<MemberWithUserEntity> for MemberResponse {
    fn from(entity: MemberWithUserEntity) -> Self {
        Self {
            user: UserPublic {
                id: entity.user_id,
                username: entity.username,
                first_name: entity.first_name,
                last_name: entity.last_name,
                reputation: entity.reputation,
                rides_taken: entity.profile_rides_taken,
                rides_offered: entity.profile_rides_offered,
            },
            is_admin: entity.is_admin,
            is_active: entity.is_active,
            invited_by: entity.invited_by_username,
            remaining_invitations: entity.remaining_invitations,
            used_invitations: entity.used_invitations,
            rides_taken: entity.rides_taken,
            rides_offered: entity.rides_offered,
            joined_at: entity.joined_at,
        }
    }
}
