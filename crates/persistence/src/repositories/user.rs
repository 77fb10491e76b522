//! User repository for database operations.

use domain::models::user::INITIAL_REPUTATION;
use domain::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::retry_read;
use crate::entities::{UserAuthEntity, UserPublicEntity, UserWithProfileEntity};
use crate::error::{storage_error, unique_violation_as};
use crate::metrics::QueryTimer;

/// Repository for user and profile database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user together with their profile row.
    ///
    /// The profile starts at the initial reputation with zeroed ride
    /// counters.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserWithProfileEntity, DomainError> {
        let timer = QueryTimer::new("create_user");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let user = sqlx::query_as::<_, UserWithProfileEntity>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, first_name, last_name, is_verified, created_at,
                      NULL::VARCHAR AS biography, $6::DOUBLE PRECISION AS reputation,
                      0 AS rides_taken, 0 AS rides_offered
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(INITIAL_REPUTATION)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation_as(
                e,
                DomainError::Validation("Username or email is already taken".into()),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, reputation)
            VALUES ($1, $2)
            "#,
        )
        .bind(user.id)
        .bind(INITIAL_REPUTATION)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok(user)
    }

    /// Find a user with their profile by username.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithProfileEntity>, DomainError> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = retry_read(|| {
            sqlx::query_as::<_, UserWithProfileEntity>(
                r#"
                SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.is_verified,
                       u.created_at,
                       p.biography, p.reputation, p.rides_taken, p.rides_offered
                FROM users u
                JOIN profiles p ON p.user_id = u.id
                WHERE u.username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Find a user with their profile by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserWithProfileEntity>, DomainError> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = retry_read(|| {
            sqlx::query_as::<_, UserWithProfileEntity>(
                r#"
                SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.is_verified,
                       u.created_at,
                       p.biography, p.reputation, p.rides_taken, p.rides_offered
                FROM users u
                JOIN profiles p ON p.user_id = u.id
                WHERE u.id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Fetch the credentials row for login verification.
    pub async fn find_auth_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAuthEntity>, DomainError> {
        let timer = QueryTimer::new("find_user_auth");
        let result = retry_read(|| {
            sqlx::query_as::<_, UserAuthEntity>(
                r#"
                SELECT id, password_hash
                FROM users
                WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Public projection of a user, for embedding in ride responses.
    pub async fn find_public_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<UserPublicEntity>, DomainError> {
        let timer = QueryTimer::new("find_user_public");
        let result = retry_read(|| {
            sqlx::query_as::<_, UserPublicEntity>(
                r#"
                SELECT u.id, u.username, u.first_name, u.last_name,
                       p.reputation, p.rides_taken, p.rides_offered
                FROM users u
                JOIN profiles p ON p.user_id = u.id
                WHERE u.id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }
}
