//! Circle repository for database operations.

use domain::models::membership::DEFAULT_INVITATION_QUOTA;
use domain::DomainError;
use shared::pagination::PageQuery;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::retry_read;
use crate::entities::{CircleEntity, CircleWithCountEntity};
use crate::error::{storage_error, unique_violation_as};
use crate::metrics::QueryTimer;

/// Repository for circle-related database operations.
#[derive(Clone)]
pub struct CircleRepository {
    pool: PgPool,
}

impl CircleRepository {
    /// Creates a new CircleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a circle and its founder membership atomically.
    ///
    /// No circle ever exists without an admin membership: both inserts
    /// commit together or not at all. The founder gets the default
    /// invitation quota.
    pub async fn create_with_founder(
        &self,
        name: &str,
        slug_name: &str,
        about: Option<&str>,
        is_public: bool,
        is_limited: bool,
        members_limit: i32,
        founder: Uuid,
    ) -> Result<CircleEntity, DomainError> {
        let timer = QueryTimer::new("create_circle");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let circle = sqlx::query_as::<_, CircleEntity>(
            r#"
            INSERT INTO circles (name, slug_name, about, is_public, is_limited, members_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, slug_name, about, rides_offered, rides_taken, verified,
                      is_public, is_limited, members_limit, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(slug_name)
        .bind(about)
        .bind(is_public)
        .bind(is_limited)
        .bind(members_limit)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation_as(
                e,
                DomainError::Validation("A circle with this slug already exists".into()),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO memberships (circle_id, user_id, is_admin, remaining_invitations)
            VALUES ($1, $2, true, $3)
            "#,
        )
        .bind(circle.id)
        .bind(founder)
        .bind(DEFAULT_INVITATION_QUOTA)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok(circle)
    }

    /// Find a circle by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<CircleEntity>, DomainError> {
        let timer = QueryTimer::new("find_circle_by_slug");
        let result = retry_read(|| {
            sqlx::query_as::<_, CircleEntity>(
                r#"
                SELECT id, name, slug_name, about, rides_offered, rides_taken, verified,
                       is_public, is_limited, members_limit, created_at, updated_at
                FROM circles
                WHERE slug_name = $1
                "#,
            )
            .bind(slug)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Find a circle by slug, joined with its active member count.
    pub async fn find_with_count_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CircleWithCountEntity>, DomainError> {
        let timer = QueryTimer::new("find_circle_with_count");
        let result = retry_read(|| {
            sqlx::query_as::<_, CircleWithCountEntity>(
                r#"
                SELECT c.id, c.name, c.slug_name, c.about, c.rides_offered, c.rides_taken,
                       c.verified, c.is_public, c.is_limited, c.members_limit, c.created_at,
                       (SELECT COUNT(*) FROM memberships m
                        WHERE m.circle_id = c.id AND m.is_active) AS member_count
                FROM circles c
                WHERE c.slug_name = $1
                "#,
            )
            .bind(slug)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// List public circles ordered by ride activity.
    pub async fn list_public(
        &self,
        page: &PageQuery,
    ) -> Result<(Vec<CircleWithCountEntity>, i64), DomainError> {
        let timer = QueryTimer::new("list_public_circles");

        let circles = retry_read(|| {
            sqlx::query_as::<_, CircleWithCountEntity>(
                r#"
                SELECT c.id, c.name, c.slug_name, c.about, c.rides_offered, c.rides_taken,
                       c.verified, c.is_public, c.is_limited, c.members_limit, c.created_at,
                       (SELECT COUNT(*) FROM memberships m
                        WHERE m.circle_id = c.id AND m.is_active) AS member_count
                FROM circles c
                WHERE c.is_public
                ORDER BY c.rides_taken DESC, c.rides_offered DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        let total = retry_read(|| {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM circles WHERE is_public
                "#,
            )
            .fetch_one(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        timer.record();
        Ok((circles, total))
    }

    /// Update a circle's editable fields.
    ///
    /// The caller merges the request with current values and validates the
    /// capacity policy beforehand; this is a plain single-row write.
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        about: Option<&str>,
        is_public: bool,
        is_limited: bool,
        members_limit: i32,
    ) -> Result<CircleEntity, DomainError> {
        let timer = QueryTimer::new("update_circle");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            UPDATE circles
            SET name = $2, about = $3, is_public = $4, is_limited = $5, members_limit = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, slug_name, about, rides_offered, rides_taken, verified,
                      is_public, is_limited, members_limit, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(about)
        .bind(is_public)
        .bind(is_limited)
        .bind(members_limit)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Count active members of a circle.
    pub async fn active_member_count(&self, circle_id: Uuid) -> Result<i64, DomainError> {
        let timer = QueryTimer::new("active_member_count");
        let result = retry_read(|| {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM memberships
                WHERE circle_id = $1 AND is_active
                "#,
            )
            .bind(circle_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }
}
