//! Ride routes: offer, list, detail, update, join, finish and rate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::rating::{validate_score, RateRideRequest, RatingResponse};
use domain::models::ride::{
    validate_schedule, CreateRideRequest, ListRidesResponse, RideResponse, UpdateRideRequest,
};
use domain::services::CircleEvent;
use domain::DomainError;
use persistence::entities::RideWithOwnerEntity;
use persistence::repositories::{RatingRepository, RideRepository};
use shared::pagination::{PageQuery, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::{require_circle, require_member, ride_response};

/// Fetch a ride by id and check it belongs to the circle.
async fn require_ride(
    repo: &RideRepository,
    circle_id: Uuid,
    ride_id: Uuid,
) -> Result<RideWithOwnerEntity, ApiError> {
    let ride = repo
        .find_by_id(ride_id)
        .await?
        .filter(|r| r.offered_in == circle_id)
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))?;
    Ok(ride)
}

/// Full API response for a ride, passengers included.
async fn full_response(
    repo: &RideRepository,
    entity: &RideWithOwnerEntity,
) -> Result<RideResponse, ApiError> {
    let passengers = repo.passengers(entity.id).await?;
    Ok(ride_response(
        entity,
        passengers.into_iter().map(Into::into).collect(),
    ))
}

/// Offer a ride in a circle. Members only.
///
/// POST /api/circles/:slug/rides
pub async fn create_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    request.validate()?;

    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let now = state.clock.now();
    validate_schedule(request.departure_date, request.arrival_date, now)?;

    let repo = RideRepository::new(state.pool.clone());
    let ride = repo
        .create_ride(
            circle.id,
            auth.user_id,
            request.departure_date,
            request.arrival_date,
            &request.departure_location,
            &request.arrival_location,
            request.available_seats,
        )
        .await?;

    info!(ride_id = %ride.id, circle_id = %circle.id, owner = %auth.user_id, "Ride offered");

    let created = require_ride(&repo, circle.id, ride.id).await?;
    let response = full_response(&repo, &created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List a circle's joinable rides ordered by departure. Members only.
///
/// GET /api/circles/:slug/rides
pub async fn list_rides(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListRidesResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let now = state.clock.now();
    let (rides, total) = repo.list_joinable(circle.id, now, &page).await?;

    let mut data = Vec::with_capacity(rides.len());
    for ride in &rides {
        data.push(full_response(&repo, ride).await?);
    }

    Ok(Json(ListRidesResponse {
        data,
        pagination: Pagination::new(&page, total),
    }))
}

/// Ride detail. Members only; finished rides stay fetchable.
///
/// GET /api/circles/:slug/rides/:ride_id
pub async fn get_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<Json<RideResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let ride = require_ride(&repo, circle.id, ride_id).await?;
    let response = full_response(&repo, &ride).await?;
    Ok(Json(response))
}

/// Update a ride's schedule or locations. Owner only, before departure.
///
/// PATCH /api/circles/:slug/rides/:ride_id
pub async fn update_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateRideRequest>,
) -> Result<Json<RideResponse>, ApiError> {
    request.validate()?;

    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let ride = entity.ride();

    if ride.offered_by != auth.user_id {
        return Err(ApiError::Domain(DomainError::NotRideOwner));
    }

    let now = state.clock.now();
    ride.check_updatable(now)?;

    let departure_date = request.departure_date.unwrap_or(ride.departure_date);
    let arrival_date = request.arrival_date.unwrap_or(ride.arrival_date);
    if request.departure_date.is_some() || request.arrival_date.is_some() {
        validate_schedule(departure_date, arrival_date, now)?;
    }
    let departure_location = request
        .departure_location
        .unwrap_or_else(|| ride.departure_location.clone());
    let arrival_location = request
        .arrival_location
        .unwrap_or_else(|| ride.arrival_location.clone());

    let updated = repo
        .update_ride(
            ride_id,
            departure_date,
            arrival_date,
            &departure_location,
            &arrival_location,
        )
        .await?;

    info!(ride_id = %updated.id, owner = %auth.user_id, "Ride updated");

    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let response = full_response(&repo, &entity).await?;
    Ok(Json(response))
}

/// Join a ride as a passenger. Members only; the owner cannot join.
///
/// POST /api/circles/:slug/rides/:ride_id/join
pub async fn join_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let now = state.clock.now();

    // Pre-check for precise error reasons; the join transaction re-checks
    // seats, liveness and the passenger constraint under its own guards.
    let is_passenger = repo.is_passenger(ride_id, auth.user_id).await?;
    entity.ride().check_joinable_by(auth.user_id, is_passenger, now)?;

    repo.join_ride(ride_id, auth.user_id, now).await?;

    info!(ride_id = %ride_id, user_id = %auth.user_id, "Passenger joined ride");

    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let response = full_response(&repo, &entity).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Finish a ride. Owner only, after departure; finishing twice is a no-op.
///
/// POST /api/circles/:slug/rides/:ride_id/finish
pub async fn finish_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<Json<RideResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let now = state.clock.now();

    entity.ride().check_finishable(auth.user_id, now)?;

    let flipped = repo.finish_ride(ride_id).await?;
    if flipped {
        info!(ride_id = %ride_id, owner = %auth.user_id, "Ride finished");

        let notifier = state.notifier.clone();
        let event = CircleEvent::RideFinished {
            circle_id: circle.id,
            ride_id,
            offered_by: auth.user_id,
        };
        tokio::spawn(async move { notifier.notify(event).await });
    }

    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let response = full_response(&repo, &entity).await?;
    Ok(Json(response))
}

/// Rate a ride's owner. Passengers only, one rating each, after departure.
///
/// POST /api/circles/:slug/rides/:ride_id/rate
pub async fn rate_ride(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
    Json(request): Json<RateRideRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
    request.validate()?;
    validate_score(request.score)?;

    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = RideRepository::new(state.pool.clone());
    let entity = require_ride(&repo, circle.id, ride_id).await?;
    let now = state.clock.now();

    if !entity.ride().has_departed(now) {
        return Err(ApiError::Domain(DomainError::RideNotStarted));
    }
    if !repo.is_passenger(ride_id, auth.user_id).await? {
        return Err(ApiError::Domain(DomainError::NotPassenger));
    }

    let rating_repo = RatingRepository::new(state.pool.clone());
    let (rating, ride_rating, reputation) = rating_repo
        .rate(
            ride_id,
            circle.id,
            auth.user_id,
            entity.offered_by,
            request.score,
            request.comments.as_deref(),
        )
        .await?;

    info!(
        ride_id = %ride_id,
        rating_user = %auth.user_id,
        score = rating.score,
        "Ride rated"
    );

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            id: rating.id,
            ride_id: rating.ride_id,
            score: rating.score,
            comments: rating.comments,
            ride_rating,
            rated_user_reputation: reputation,
            created_at: rating.created_at,
        }),
    ))
}
