//! Rating repository for database operations.

use domain::models::rating::round_mean;
use domain::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RatingEntity;
use crate::error::{storage_error, unique_violation_as};
use crate::metrics::QueryTimer;

/// Repository for rating-related database operations.
#[derive(Clone)]
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    /// Creates a new RatingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a rating and fold it into both aggregates.
    ///
    /// One transaction: insert the rating, recompute the ride's mean score,
    /// recompute the rated user's reputation across all their rated rides.
    /// Both means are rounded to one decimal. The (ride, rating_user)
    /// uniqueness constraint rejects a second rating from the same
    /// passenger.
    ///
    /// Returns the stored rating together with the refreshed ride rating
    /// and rated-user reputation.
    pub async fn rate(
        &self,
        ride_id: Uuid,
        circle_id: Uuid,
        rating_user: Uuid,
        rated_user: Uuid,
        score: i32,
        comments: Option<&str>,
    ) -> Result<(RatingEntity, f64, f64), DomainError> {
        let timer = QueryTimer::new("rate_ride");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let rating = sqlx::query_as::<_, RatingEntity>(
            r#"
            INSERT INTO ratings (ride_id, circle_id, rating_user, rated_user, score, comments)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ride_id, circle_id, rating_user, rated_user, score, comments,
                      created_at
            "#,
        )
        .bind(ride_id)
        .bind(circle_id)
        .bind(rating_user)
        .bind(rated_user)
        .bind(score)
        .bind(comments)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, DomainError::DuplicateRating))?;

        // The insert above is visible inside the transaction, so both
        // averages include the new score.
        let ride_mean = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT AVG(score)::DOUBLE PRECISION FROM ratings WHERE ride_id = $1
            "#,
        )
        .bind(ride_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;
        let ride_rating = round_mean(ride_mean);

        sqlx::query("UPDATE rides SET rating = $2, updated_at = now() WHERE id = $1")
            .bind(ride_id)
            .bind(ride_rating)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let reputation_mean = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT AVG(score)::DOUBLE PRECISION FROM ratings WHERE rated_user = $1
            "#,
        )
        .bind(rated_user)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;
        let reputation = round_mean(reputation_mean);

        sqlx::query("UPDATE profiles SET reputation = $2 WHERE user_id = $1")
            .bind(rated_user)
            .bind(reputation)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok((rating, ride_rating, reputation))
    }
}
