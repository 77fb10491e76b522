//! Membership repository for database operations.
//!
//! Holds the join-circle transaction: the only place where an invitation is
//! consumed, a membership is created and the issuer's quota moves, all as
//! one atomic unit.

use chrono::{DateTime, Utc};
use domain::models::circle::can_accept_member;
use domain::models::membership::DEFAULT_INVITATION_QUOTA;
use domain::DomainError;
use shared::pagination::PageQuery;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::retry_read;
use crate::entities::{InvitationEntity, MemberWithUserEntity, MembershipEntity};
use crate::error::{storage_error, unique_violation_as};
use crate::metrics::QueryTimer;

const MEMBER_SELECT: &str = r#"
    SELECT m.is_admin, m.is_active, m.remaining_invitations, m.used_invitations,
           m.rides_taken, m.rides_offered, m.joined_at,
           u.id AS user_id, u.username, u.first_name, u.last_name,
           p.reputation,
           p.rides_taken AS profile_rides_taken,
           p.rides_offered AS profile_rides_offered,
           iu.username AS invited_by_username
    FROM memberships m
    JOIN users u ON u.id = m.user_id
    JOIN profiles p ON p.user_id = u.id
    LEFT JOIN users iu ON iu.id = m.invited_by
"#;

/// Repository for membership-related database operations.
#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    /// Creates a new MembershipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active membership for (user, circle).
    ///
    /// This is the authorization primitive: a soft-left membership does not
    /// show up here and therefore authorizes nothing.
    pub async fn find_active(
        &self,
        circle_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipEntity>, DomainError> {
        let timer = QueryTimer::new("find_active_membership");
        let result = retry_read(|| {
            sqlx::query_as::<_, MembershipEntity>(
                r#"
                SELECT id, circle_id, user_id, is_admin, is_active, invited_by,
                       remaining_invitations, used_invitations, rides_taken, rides_offered,
                       joined_at
                FROM memberships
                WHERE circle_id = $1 AND user_id = $2 AND is_active
                "#,
            )
            .bind(circle_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Find a member of a circle by username, joined with user info.
    pub async fn find_member(
        &self,
        circle_id: Uuid,
        username: &str,
    ) -> Result<Option<MemberWithUserEntity>, DomainError> {
        let timer = QueryTimer::new("find_member");
        let sql = format!(
            "{MEMBER_SELECT} WHERE m.circle_id = $1 AND u.username = $2 AND m.is_active"
        );
        let result = retry_read(|| {
            sqlx::query_as::<_, MemberWithUserEntity>(&sql)
                .bind(circle_id)
                .bind(username)
                .fetch_optional(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// List the active members of a circle.
    pub async fn list_active(
        &self,
        circle_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<MemberWithUserEntity>, i64), DomainError> {
        let timer = QueryTimer::new("list_members");

        let sql = format!(
            "{MEMBER_SELECT} WHERE m.circle_id = $1 AND m.is_active \
             ORDER BY m.joined_at ASC LIMIT $2 OFFSET $3"
        );
        let members = retry_read(|| {
            sqlx::query_as::<_, MemberWithUserEntity>(&sql)
                .bind(circle_id)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        let total = retry_read(|| {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM memberships WHERE circle_id = $1 AND is_active
                "#,
            )
            .bind(circle_id)
            .fetch_one(&self.pool)
        })
        .await
        .map_err(storage_error)?;

        timer.record();
        Ok((members, total))
    }

    /// Memberships created from codes issued by the given member.
    pub async fn list_invited_by(
        &self,
        circle_id: Uuid,
        issuer: Uuid,
    ) -> Result<Vec<MemberWithUserEntity>, DomainError> {
        let timer = QueryTimer::new("list_invited_by");
        let sql = format!("{MEMBER_SELECT} WHERE m.circle_id = $1 AND m.invited_by = $2");
        let result = retry_read(|| {
            sqlx::query_as::<_, MemberWithUserEntity>(&sql)
                .bind(circle_id)
                .bind(issuer)
                .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Join a circle by redeeming an invitation code.
    ///
    /// Validation order: AlreadyMember, then InvalidInvitation, then
    /// CircleFull. The circle row is locked for the duration so the
    /// capacity check and the membership insert cannot interleave with a
    /// concurrent joiner; the (circle, user) uniqueness constraint resolves
    /// whatever the pre-check misses. The capacity policy is read under the
    /// same lock, so a limit committed moments before the join always
    /// applies.
    ///
    /// On success the membership insert, the invitation consumption and the
    /// issuer quota update commit together or not at all.
    pub async fn join_circle(
        &self,
        circle_id: Uuid,
        code: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(MembershipEntity, InvitationEntity), DomainError> {
        let timer = QueryTimer::new("join_circle");

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Serialize concurrent joins on this circle and pin the capacity
        // policy for the rest of the transaction.
        let (is_limited, members_limit) = sqlx::query_as::<_, (bool, i32)>(
            "SELECT is_limited, members_limit FROM circles WHERE id = $1 FOR UPDATE",
        )
        .bind(circle_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        let existing = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships WHERE circle_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;
        if existing {
            return Err(DomainError::AlreadyMember);
        }

        // Redeem: locate the unused code for this circle and lock it.
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, code, circle_id, issued_by, used, used_by, used_at, created_at
            FROM invitations
            WHERE code = $1 AND circle_id = $2 AND NOT used
            FOR UPDATE
            "#,
        )
        .bind(code)
        .bind(circle_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .ok_or(DomainError::InvalidInvitation)?;

        // Capacity, re-validated under the circle lock.
        let active_members = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships WHERE circle_id = $1 AND is_active
            "#,
        )
        .bind(circle_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;
        if !can_accept_member(is_limited, members_limit, active_members) {
            return Err(DomainError::CircleFull);
        }

        let membership = sqlx::query_as::<_, MembershipEntity>(
            r#"
            INSERT INTO memberships (circle_id, user_id, invited_by, remaining_invitations)
            VALUES ($1, $2, $3, $4)
            RETURNING id, circle_id, user_id, is_admin, is_active, invited_by,
                      remaining_invitations, used_invitations, rides_taken, rides_offered,
                      joined_at
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .bind(invitation.issued_by)
        .bind(DEFAULT_INVITATION_QUOTA)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, DomainError::AlreadyMember))?;

        // Consume the code. Once used, used_by and used_at never change.
        let invitation = sqlx::query_as::<_, InvitationEntity>(
            r#"
            UPDATE invitations
            SET used = true, used_by = $2, used_at = $3
            WHERE id = $1
            RETURNING id, code, circle_id, issued_by, used, used_by, used_at, created_at
            "#,
        )
        .bind(invitation.id)
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        // Issuer quota: floor at zero; going negative would be a
        // data-integrity bug, not a user-facing error.
        sqlx::query(
            r#"
            UPDATE memberships
            SET used_invitations = used_invitations + 1,
                remaining_invitations = GREATEST(remaining_invitations - 1, 0)
            WHERE circle_id = $1 AND user_id = $2
            "#,
        )
        .bind(circle_id)
        .bind(invitation.issued_by)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        timer.record();
        Ok((membership, invitation))
    }

    /// Leave a circle: flip the membership inactive.
    ///
    /// The row persists for audit and history. Already-issued invitations
    /// from this member stay redeemable.
    pub async fn leave(&self, circle_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let timer = QueryTimer::new("leave_circle");
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET is_active = false
            WHERE circle_id = $1 AND user_id = $2 AND is_active
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
