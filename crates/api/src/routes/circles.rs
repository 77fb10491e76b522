//! Circle routes: create, list, detail and update.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::circle::{
    validate_capacity_policy, CircleResponse, CreateCircleRequest, ListCirclesResponse,
    UpdateCircleRequest,
};
use persistence::entities::CircleEntity;
use persistence::repositories::CircleRepository;
use shared::pagination::{PageQuery, Pagination};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::{require_circle, require_member};

fn circle_response(entity: CircleEntity, member_count: i64) -> CircleResponse {
    CircleResponse {
        id: entity.id,
        name: entity.name,
        slug_name: entity.slug_name,
        about: entity.about,
        rides_offered: entity.rides_offered,
        rides_taken: entity.rides_taken,
        verified: entity.verified,
        is_public: entity.is_public,
        is_limited: entity.is_limited,
        members_limit: entity.members_limit,
        member_count,
        created_at: entity.created_at,
    }
}

/// Create a circle; the caller becomes its admin founder.
///
/// POST /api/circles
pub async fn create_circle(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateCircleRequest>,
) -> Result<(StatusCode, Json<CircleResponse>), ApiError> {
    request.validate()?;
    validate_capacity_policy(request.is_limited, request.members_limit)?;

    let repo = CircleRepository::new(state.pool.clone());
    let circle = repo
        .create_with_founder(
            &request.name,
            &request.slug_name,
            request.about.as_deref(),
            request.is_public,
            request.is_limited,
            request.members_limit,
            auth.user_id,
        )
        .await?;

    info!(circle_id = %circle.id, slug = %circle.slug_name, founder = %auth.user_id, "Circle created");

    // The founder membership is the only one at this point.
    Ok((StatusCode::CREATED, Json(circle_response(circle, 1))))
}

/// List public circles ordered by ride activity.
///
/// GET /api/circles
pub async fn list_circles(
    State(state): State<AppState>,
    _auth: UserAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListCirclesResponse>, ApiError> {
    let repo = CircleRepository::new(state.pool.clone());
    let (circles, total) = repo.list_public(&page).await?;

    Ok(Json(ListCirclesResponse {
        data: circles.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

/// Circle detail by slug.
///
/// GET /api/circles/:slug
///
/// Private circles are visible to their active members only.
pub async fn get_circle(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
) -> Result<Json<CircleResponse>, ApiError> {
    let repo = CircleRepository::new(state.pool.clone());
    let circle = repo
        .find_with_count_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Circle '{}' not found", slug)))?;

    if !circle.is_public {
        require_member(&state, circle.id, auth.user_id).await?;
    }

    Ok(Json(circle.into()))
}

/// Update a circle's editable fields. Admin members only.
///
/// PATCH /api/circles/:slug
pub async fn update_circle(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<UpdateCircleRequest>,
) -> Result<Json<CircleResponse>, ApiError> {
    request.validate()?;

    let circle = require_circle(&state, &slug).await?;
    let membership = require_member(&state, circle.id, auth.user_id).await?;
    if !membership.is_admin {
        return Err(ApiError::Forbidden(
            "Only circle admins can update the circle".to_string(),
        ));
    }

    // Merge with current values, then re-check the capacity policy on the
    // merged pair so a partial update cannot break the invariant.
    let name = request.name.unwrap_or_else(|| circle.name.clone());
    let about = request.about.or_else(|| circle.about.clone());
    let is_public = request.is_public.unwrap_or(circle.is_public);
    let is_limited = request.is_limited.unwrap_or(circle.is_limited);
    let members_limit = request.members_limit.unwrap_or(circle.members_limit);
    validate_capacity_policy(is_limited, members_limit)?;

    let repo = CircleRepository::new(state.pool.clone());
    let updated = repo
        .update(
            circle.id,
            &name,
            about.as_deref(),
            is_public,
            is_limited,
            members_limit,
        )
        .await?;
    let member_count = repo.active_member_count(circle.id).await?;

    info!(circle_id = %circle.id, slug = %slug, "Circle updated");

    Ok(Json(circle_response(updated, member_count)))
}
