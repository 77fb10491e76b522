//! Membership routes: join, list, detail, leave and the invitation pool.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::membership::{
    InvitationPoolResponse, JoinCircleRequest, ListMembersResponse, MemberResponse,
};
use domain::models::Invitation;
use domain::services::CircleEvent;
use persistence::repositories::{InvitationRepository, MembershipRepository, UserRepository};
use shared::pagination::{PageQuery, Pagination};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::routes::{require_circle, require_member};

/// List the active members of a circle. Members only.
///
/// GET /api/circles/:slug/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = MembershipRepository::new(state.pool.clone());
    let (members, total) = repo.list_active(circle.id, &page).await?;

    Ok(Json(ListMembersResponse {
        data: members.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

/// Member detail by username. Members only.
///
/// GET /api/circles/:slug/members/:username
pub async fn get_member(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<Json<MemberResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    require_member(&state, circle.id, auth.user_id).await?;

    let repo = MembershipRepository::new(state.pool.clone());
    let member = repo
        .find_member(circle.id, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member '{}' not found", username)))?;

    Ok(Json(member.into()))
}

/// Join a circle by redeeming an invitation code.
///
/// POST /api/circles/:slug/members
pub async fn join_circle(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<JoinCircleRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    request.validate()?;

    let circle = require_circle(&state, &slug).await?;
    let now = state.clock.now();

    let repo = MembershipRepository::new(state.pool.clone());
    let (membership, invitation) = repo
        .join_circle(circle.id, &request.invitation_code, auth.user_id, now)
        .await?;
    let invitation = Invitation::from(invitation);

    info!(
        circle_id = %circle.id,
        user_id = %auth.user_id,
        issued_by = %invitation.issued_by,
        "Member joined circle"
    );

    let notifier = state.notifier.clone();
    let event = CircleEvent::InvitationRedeemed {
        circle_id: circle.id,
        invitation_code: invitation.code,
        new_member: auth.user_id,
        issued_by: invitation.issued_by,
    };
    tokio::spawn(async move { notifier.notify(event).await });

    let user_repo = UserRepository::new(state.pool.clone());
    let user = user_repo
        .find_public_by_id(membership.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Member user row missing after join".to_string()))?;
    let member = repo
        .find_member(circle.id, &user.username)
        .await?
        .ok_or_else(|| ApiError::Internal("Membership row missing after join".to_string()))?;

    Ok((StatusCode::CREATED, Json(member.into())))
}

/// Leave a circle, or remove a member as an admin.
///
/// DELETE /api/circles/:slug/members/:username
pub async fn remove_member(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    let caller = require_member(&state, circle.id, auth.user_id).await?;

    let repo = MembershipRepository::new(state.pool.clone());
    let target = repo
        .find_member(circle.id, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member '{}' not found", username)))?;

    if target.user_id != auth.user_id && !caller.is_admin {
        return Err(ApiError::Forbidden(
            "Only circle admins can remove other members".to_string(),
        ));
    }

    repo.leave(circle.id, target.user_id).await?;

    info!(
        circle_id = %circle.id,
        user_id = %target.user_id,
        removed_by = %auth.user_id,
        "Member left circle"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// A member's invitation pool: who joined with their codes and which codes
/// are still outstanding. Fresh codes are issued lazily up to the member's
/// remaining quota.
///
/// GET /api/circles/:slug/members/:username/invitations
pub async fn invitation_pool(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<Json<InvitationPoolResponse>, ApiError> {
    let circle = require_circle(&state, &slug).await?;
    let membership = require_member(&state, circle.id, auth.user_id).await?;

    // Codes are visible to their issuer only.
    let user_repo = UserRepository::new(state.pool.clone());
    let caller = user_repo
        .find_public_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Caller user row missing".to_string()))?;
    if caller.username != username {
        return Err(ApiError::Forbidden(
            "Members can only view their own invitations".to_string(),
        ));
    }

    let invitation_repo = InvitationRepository::new(state.pool.clone());
    let invitations = invitation_repo
        .ensure_pool(circle.id, auth.user_id, membership.remaining_invitations)
        .await?;

    let membership_repo = MembershipRepository::new(state.pool.clone());
    let used_invitations = membership_repo
        .list_invited_by(circle.id, auth.user_id)
        .await?;

    Ok(Json(InvitationPoolResponse {
        used_invitations: used_invitations.into_iter().map(Into::into).collect(),
        invitations,
    }))
}
