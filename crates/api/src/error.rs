use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// HTTP status for a domain error.
///
/// Authorization failures are 403, state conflicts are 409, input problems
/// are 400, and storage trouble is the only 5xx the domain can produce.
fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::InvalidInvitation | DomainError::InvalidScore => {
            StatusCode::BAD_REQUEST
        }
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::NotCircleMember | DomainError::NotRideOwner | DomainError::NotPassenger => {
            StatusCode::FORBIDDEN
        }
        DomainError::AlreadyMember
        | DomainError::CircleFull
        | DomainError::RideNotJoinable(_)
        | DomainError::RideLocked
        | DomainError::RideNotStarted
        | DomainError::DuplicateRating => StatusCode::CONFLICT,
        DomainError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::Domain(err) => {
                if let DomainError::StorageUnavailable(msg) = err {
                    tracing::error!("Storage unavailable: {}", msg);
                }
                (domain_status(err), err.kind(), err.to_string())
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("Invalid value for {}", field),
                    }
                })
            })
            .collect();

        ApiError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validation_status() {
        let response = ApiError::Validation("bad input".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_authorization_errors_are_forbidden() {
        for err in [
            DomainError::NotCircleMember,
            DomainError::NotRideOwner,
            DomainError::NotPassenger,
        ] {
            assert_eq!(domain_status(&err), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_domain_state_conflicts() {
        assert_eq!(
            domain_status(&DomainError::AlreadyMember),
            StatusCode::CONFLICT
        );
        assert_eq!(
            domain_status(&DomainError::CircleFull),
            StatusCode::CONFLICT
        );
        assert_eq!(
            domain_status(&DomainError::DuplicateRating),
            StatusCode::CONFLICT
        );
        assert_eq!(
            domain_status(&DomainError::RideNotJoinable("full".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_domain_input_errors() {
        assert_eq!(
            domain_status(&DomainError::InvalidInvitation),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            domain_status(&DomainError::InvalidScore),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_unavailable_is_503() {
        let response =
            ApiError::from(DomainError::StorageUnavailable("pool timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_domain_error_code_is_kind() {
        let err = ApiError::from(DomainError::AlreadyMember);
        match err {
            ApiError::Domain(inner) => assert_eq!(inner.kind(), "already_member"),
            _ => panic!("Expected Domain variant"),
        }
    }
}
