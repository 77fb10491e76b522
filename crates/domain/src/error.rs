//! Domain error taxonomy.
//!
//! Every operation in the core returns these as typed results; nothing below
//! the API boundary raises them as panics or uses errors for control flow.

use thiserror::Error;

/// Errors produced by the membership, ride and rating state machines.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("The user is already a member of this circle")]
    AlreadyMember,

    #[error("Invalid invitation code")]
    InvalidInvitation,

    #[error("Circle has reached its members limit")]
    CircleFull,

    #[error("User is not an active member of the circle")]
    NotCircleMember,

    #[error("Ride cannot be joined: {0}")]
    RideNotJoinable(String),

    #[error("Ongoing rides cannot be modified")]
    RideLocked,

    #[error("Only the ride owner can perform this action")]
    NotRideOwner,

    #[error("Ride has not started yet")]
    RideNotStarted,

    #[error("The ride has already been rated by this user")]
    DuplicateRating,

    #[error("User is not a passenger of the ride")]
    NotPassenger,

    #[error("Rating must be between 1 and 5")]
    InvalidScore,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl DomainError {
    /// Stable machine-readable error kind, surfaced in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::AlreadyMember => "already_member",
            DomainError::InvalidInvitation => "invalid_invitation",
            DomainError::CircleFull => "circle_full",
            DomainError::NotCircleMember => "not_circle_member",
            DomainError::RideNotJoinable(_) => "ride_not_joinable",
            DomainError::RideLocked => "ride_locked",
            DomainError::NotRideOwner => "not_ride_owner",
            DomainError::RideNotStarted => "ride_not_started",
            DomainError::DuplicateRating => "duplicate_rating",
            DomainError::NotPassenger => "not_passenger",
            DomainError::InvalidScore => "invalid_score",
            DomainError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(DomainError::AlreadyMember.kind(), "already_member");
        assert_eq!(DomainError::InvalidInvitation.kind(), "invalid_invitation");
        assert_eq!(DomainError::CircleFull.kind(), "circle_full");
        assert_eq!(
            DomainError::RideNotJoinable("full".into()).kind(),
            "ride_not_joinable"
        );
        assert_eq!(
            DomainError::StorageUnavailable("timeout".into()).kind(),
            "storage_unavailable"
        );
    }

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(
            DomainError::NotPassenger.to_string(),
            "User is not a passenger of the ride"
        );
        assert_eq!(
            DomainError::RideNotJoinable("there is no room in this ride".into()).to_string(),
            "Ride cannot be joined: there is no room in this ride"
        );
    }
}
