//! Route handlers.

pub mod circles;
pub mod health;
pub mod memberships;
pub mod rides;
pub mod users;

use domain::models::user::UserPublic;
use domain::models::{Circle, Membership};
use domain::DomainError;
use persistence::entities::RideWithOwnerEntity;
use persistence::repositories::{CircleRepository, MembershipRepository};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::ride::RideResponse;

/// Resolve a circle by slug or 404.
pub(crate) async fn require_circle(state: &AppState, slug: &str) -> Result<Circle, ApiError> {
    let repo = CircleRepository::new(state.pool.clone());
    repo.find_by_slug(slug)
        .await?
        .map(Circle::from)
        .ok_or_else(|| ApiError::NotFound(format!("Circle '{}' not found", slug)))
}

/// Resolve the caller's active membership or fail NotCircleMember.
///
/// This is the authorization gate for every circle-scoped operation; a
/// soft-left membership does not pass it.
pub(crate) async fn require_member(
    state: &AppState,
    circle_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, ApiError> {
    let repo = MembershipRepository::new(state.pool.clone());
    repo.find_active(circle_id, user_id)
        .await?
        .map(Membership::from)
        .ok_or(ApiError::Domain(DomainError::NotCircleMember))
}

/// Assemble the API shape of a ride from its joined row and passenger list.
pub(crate) fn ride_response(
    entity: &RideWithOwnerEntity,
    passengers: Vec<UserPublic>,
) -> RideResponse {
    RideResponse {
        id: entity.id,
        offered_by: UserPublic {
            id: entity.offered_by,
            username: entity.owner_username.clone(),
            first_name: entity.owner_first_name.clone(),
            last_name: entity.owner_last_name.clone(),
            reputation: entity.owner_reputation,
            rides_taken: entity.owner_rides_taken,
            rides_offered: entity.owner_rides_offered,
        },
        offered_in: entity.circle_slug.clone(),
        departure_date: entity.departure_date,
        arrival_date: entity.arrival_date,
        departure_location: entity.departure_location.clone(),
        arrival_location: entity.arrival_location.clone(),
        available_seats: entity.available_seats,
        passengers,
        rating: entity.rating,
        is_active: entity.is_active,
        created_at: entity.created_at,
    }
}
