//! Mapping from sqlx errors to the domain error taxonomy.
//!
//! Uniqueness violations are mapped contextually at the call site: the same
//! database error means `AlreadyMember` inside a join-circle transaction and
//! `DuplicateRating` inside a rate transaction.

use domain::DomainError;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// True when the error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

/// Map a non-contextual sqlx error into the domain taxonomy.
pub fn storage_error(err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::NotFound("Resource not found".into()),
        sqlx::Error::PoolTimedOut => {
            DomainError::StorageUnavailable("Timed out acquiring a database connection".into())
        }
        other => DomainError::StorageUnavailable(other.to_string()),
    }
}

/// Map a sqlx error, treating a unique violation as the given domain error.
pub fn unique_violation_as(err: sqlx::Error, conflict: DomainError) -> DomainError {
    if is_unique_violation(&err) {
        conflict
    } else {
        storage_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            storage_error(sqlx::Error::RowNotFound),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn test_pool_timeout_maps_to_storage_unavailable() {
        assert!(matches!(
            storage_error(sqlx::Error::PoolTimedOut),
            DomainError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn test_non_unique_errors_keep_storage_mapping() {
        let err = unique_violation_as(sqlx::Error::PoolTimedOut, DomainError::AlreadyMember);
        assert!(matches!(err, DomainError::StorageUnavailable(_)));
    }
}
