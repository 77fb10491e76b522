//! Ride repository for database operations.
//!
//! Ride creation and joining are the two "apply ride event" transactions:
//! each updates the ride plus the circle, membership and profile counters
//! as one unit, so every stats increment has a matching event.

use chrono::{DateTime, Duration, Utc};
use domain::models::ride::MIN_DEPARTURE_LEAD_MINUTES;
use domain::DomainError;
use shared::pagination::PageQuery;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::retry_read;
use crate::entities::{RideEntity, RideWithOwnerEntity, UserPublicEntity};
use crate::error::{storage_error, unique_violation_as};
use crate::metrics::QueryTimer;

const RIDE_SELECT: &str = r#"
    SELECT r.id, r.offered_by, r.offered_in, r.departure_date, r.arrival_date,
           r.departure_location, r.arrival_location, r.available_seats, r.rating,
           r.is_active, r.created_at, r.updated_at,
           c.slug_name AS circle_slug,
           u.username AS owner_username,
           u.first_name AS owner_first_name,
           u.last_name AS owner_last_name,
           p.reputation AS owner_reputation,
           p.rides_taken AS owner_rides_taken,
           p.rides_offered AS owner_rides_offered
    FROM rides r
    JOIN circles c ON c.id = r.offered_in
    JOIN users u ON u.id = r.offered_by
    JOIN profiles p ON p.user_id = u.id
"#;

/// Repository for ride-related database operations.
#[derive(Clone)]
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    /// Creates a new RideRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a ride and record the "ride offered" event.
    ///
    /// Four writes, one transaction: the ride row plus the circle,
    /// membership and profile `rides_offered` counters.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_ride(
        &self,
        circle_id: Uuid,
        owner: Uuid,
        departure_date: DateTime<Utc>,
        arrival_date: DateTime<Utc>,
        departure_location: &str,
        arrival_location: &str,
        available_seats: i32,
    ) -> Result<RideEntity, DomainError> {
        let timer = QueryTimer::new("create_ride");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let ride = sqlx::query_as::<_, RideEntity>(
            r#"
            INSERT INTO rides (offered_by, offered_in, departure_date, arrival_date,
                               departure_location, arrival_location, available_seats)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, offered_by, offered_in, departure_date, arrival_date,
                      departure_location, arrival_location, available_seats, rating,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(circle_id)
        .bind(departure_date)
        .bind(arrival_date)
        .bind(departure_location)
        .bind(arrival_location)
        .bind(available_seats)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query("UPDATE circles SET rides_offered = rides_offered + 1 WHERE id = $1")
            .bind(circle_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query(
            r#"
            UPDATE memberships SET rides_offered = rides_offered + 1
            WHERE circle_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(circle_id)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query("UPDATE profiles SET rides_offered = rides_offered + 1 WHERE user_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok(ride)
    }

    /// Add a passenger and record the "ride taken" event.
    ///
    /// The seat decrement is a conditional update that re-checks liveness,
    /// seat count and departure inside the transaction; a ride expiring or
    /// filling up concurrently makes the update match zero rows and the
    /// whole join rolls back. The (ride, user) primary key rejects a
    /// double join.
    pub async fn join_ride(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RideEntity, DomainError> {
        let timer = QueryTimer::new("join_ride");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let ride = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET available_seats = available_seats - 1, updated_at = now()
            WHERE id = $1 AND is_active AND available_seats >= 1 AND departure_date > $2
            RETURNING id, offered_by, offered_in, departure_date, arrival_date,
                      departure_location, arrival_location, available_seats, rating,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(ride_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| DomainError::RideNotJoinable("the ride is no longer joinable".into()))?;

        sqlx::query(
            r#"
            INSERT INTO ride_passengers (ride_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(ride_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation_as(
                e,
                DomainError::RideNotJoinable("the user already joined this ride".into()),
            )
        })?;

        sqlx::query("UPDATE profiles SET rides_taken = rides_taken + 1 WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query(
            r#"
            UPDATE memberships SET rides_taken = rides_taken + 1
            WHERE circle_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(ride.offered_in)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query("UPDATE circles SET rides_taken = rides_taken + 1 WHERE id = $1")
            .bind(ride.offered_in)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok(ride)
    }

    /// Update a ride's schedule and locations.
    pub async fn update_ride(
        &self,
        ride_id: Uuid,
        departure_date: DateTime<Utc>,
        arrival_date: DateTime<Utc>,
        departure_location: &str,
        arrival_location: &str,
    ) -> Result<RideEntity, DomainError> {
        let timer = QueryTimer::new("update_ride");
        let result = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET departure_date = $2, arrival_date = $3,
                departure_location = $4, arrival_location = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, offered_by, offered_in, departure_date, arrival_date,
                      departure_location, arrival_location, available_seats, rating,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(ride_id)
        .bind(departure_date)
        .bind(arrival_date)
        .bind(departure_location)
        .bind(arrival_location)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Flip a ride to finished. A no-op when already finished, which makes
    /// the terminal transition idempotent under concurrent finish/expire.
    pub async fn finish_ride(&self, ride_id: Uuid) -> Result<bool, DomainError> {
        let timer = QueryTimer::new("finish_ride");
        let result = sqlx::query(
            r#"
            UPDATE rides SET is_active = false, updated_at = now()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(ride_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Finish every active ride whose arrival has passed.
    ///
    /// Safe to run repeatedly and concurrently with join/finish: the flip
    /// matches only still-active rows, and join re-checks `is_active`
    /// inside its own transaction.
    pub async fn expire_rides(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let timer = QueryTimer::new("expire_rides");
        let result = sqlx::query(
            r#"
            UPDATE rides SET is_active = false, updated_at = now()
            WHERE is_active AND arrival_date <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Find a ride by id, joined with owner and circle info.
    ///
    /// Finished and past rides stay fetchable here for rating purposes;
    /// only the joinable listing filters them out.
    pub async fn find_by_id(
        &self,
        ride_id: Uuid,
    ) -> Result<Option<RideWithOwnerEntity>, DomainError> {
        let timer = QueryTimer::new("find_ride_by_id");
        let sql = format!("{RIDE_SELECT} WHERE r.id = $1");
        let result = retry_read(|| {
            sqlx::query_as::<_, RideWithOwnerEntity>(&sql)
                .bind(ride_id)
                .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// List a circle's joinable rides: active, seats left, departing at
    /// least the minimum lead time from now.
    pub async fn list_joinable(
        &self,
        circle_id: Uuid,
        now: DateTime<Utc>,
        page: &PageQuery,
    ) -> Result<(Vec<RideWithOwnerEntity>, i64), DomainError> {
        let timer = QueryTimer::new("list_joinable_rides");
        let offset = now + Duration::minutes(MIN_DEPARTURE_LEAD_MINUTES);

        let sql = format!(
            "{RIDE_SELECT} \
             WHERE r.offered_in = $1 AND r.is_active \
               AND r.available_seats >= 1 AND r.departure_date >= $2 \
             ORDER BY r.departure_date ASC LIMIT $3 OFFSET $4"
        );
        let rides = retry_read(|| {
            sqlx::query_as::<_, RideWithOwnerEntity>(&sql)
                .bind(circle_id)
                .bind(offset)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        let total = retry_read(|| {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM rides
                WHERE offered_in = $1 AND is_active
                  AND available_seats >= 1 AND departure_date >= $2
                "#,
            )
            .bind(circle_id)
            .bind(offset)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        timer.record();
        Ok((rides, total))
    }

    /// Public projections of a ride's passengers.
    pub async fn passengers(&self, ride_id: Uuid) -> Result<Vec<UserPublicEntity>, DomainError> {
        let timer = QueryTimer::new("list_passengers");
        let result = retry_read(|| {
            sqlx::query_as::<_, UserPublicEntity>(
                r#"
                SELECT u.id, u.username, u.first_name, u.last_name,
                       p.reputation, p.rides_taken, p.rides_offered
                FROM ride_passengers rp
                JOIN users u ON u.id = rp.user_id
                JOIN profiles p ON p.user_id = u.id
                WHERE rp.ride_id = $1
                ORDER BY rp.joined_at ASC
                "#,
            )
            .bind(ride_id)
            .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Whether the user is a passenger of the ride.
    pub async fn is_passenger(&self, ride_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let timer = QueryTimer::new("is_passenger");
        let result = retry_read(|| {
            sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM ride_passengers WHERE ride_id = $1 AND user_id = $2
                )
                "#,
            )
            .bind(ride_id)
            .bind(user_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }
}
