//! User and profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered user. Identity only; public stats live on [`Profile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's public profile: biography plus accumulated ride statistics.
///
/// One row per user, created at signup. Reputation starts at 5.0 and is
/// recomputed from ratings received across all rides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub user_id: Uuid,
    pub biography: Option<String>,
    pub reputation: f64,
    pub rides_taken: i32,
    pub rides_offered: i32,
}

/// Reputation assigned to a profile before any ratings exist.
pub const INITIAL_REPUTATION: f64 = 5.0;

/// Request payload for signup.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SignupRequest {
    #[validate(length(
        min = 3,
        max = 30,
        message = "Username must be between 3 and 30 characters"
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
}

/// Request payload for login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public user info embedded in membership and ride responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub reputation: f64,
    pub rides_taken: i32,
    pub rides_offered: i32,
}

/// Response after signup or for a profile lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub profile: ProfileInfo,
    pub created_at: DateTime<Utc>,
}

/// Profile portion of user responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfileInfo {
    pub biography: Option<String>,
    pub reputation: f64,
    pub rides_taken: i32,
    pub rides_offered: i32,
}

/// Response after login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            username: "camila".into(),
            email: "camila@example.com".into(),
            password: "super-secret-pw".into(),
            first_name: "Camila".into(),
            last_name: "Reyes".into(),
        };
        assert!(valid.validate().is_ok());

        let short_username = SignupRequest {
            username: "cc".into(),
            ..valid.clone()
        };
        assert!(short_username.validate().is_err());

        let bad_email = SignupRequest {
            email: "not-an-email".into(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            password: "short".into(),
            ..valid
        };
        assert!(short_password.validate().is_err());
    }
}
