//! User routes: signup, login and profile lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::user::{LoginRequest, LoginResponse, SignupRequest, UserResponse};
use persistence::repositories::UserRepository;
use shared::password::{hash_password, verify_password};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Register a new user.
///
/// POST /api/users/signup
///
/// Creates the user and their profile (reputation 5.0, zeroed counters)
/// atomically.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .create_user(
            &request.username,
            &request.email,
            &password_hash,
            &request.first_name,
            &request.last_name,
        )
        .await?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Authenticate and issue an access token.
///
/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());

    // Same rejection for unknown user and wrong password.
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let auth = repo
        .find_auth_by_username(&request.username)
        .await?
        .ok_or_else(invalid)?;

    let verified = verify_password(&request.password, &auth.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;
    if !verified {
        return Err(invalid());
    }

    let (access_token, jti) = state
        .jwt
        .generate_access_token(auth.id)
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    let user = repo
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::Internal("User row vanished during login".to_string()))?;

    info!(user_id = %auth.id, jti = %jti, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        user: user.into(),
    }))
}

/// Fetch a user with their profile by username.
///
/// GET /api/users/:username
pub async fn get_user(
    State(state): State<AppState>,
    _auth: UserAuth,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", username)))?;

    Ok(Json(user.into()))
}
