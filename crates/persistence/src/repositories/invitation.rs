//! Invitation repository for database operations.

use domain::models::invitation::generate_invitation_code;
use domain::models::membership::pool_deficit;
use domain::DomainError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::retry_read;
use crate::entities::InvitationEntity;
use crate::error::{is_unique_violation, storage_error};
use crate::metrics::QueryTimer;

/// Repository for invitation-related database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Creates a new InvitationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a new unused code scoped to a circle and issuer.
    ///
    /// Regenerates on code collision; the unique constraint on `code` is
    /// the arbiter.
    pub async fn issue(
        &self,
        circle_id: Uuid,
        issuer: Uuid,
    ) -> Result<InvitationEntity, DomainError> {
        let timer = QueryTimer::new("issue_invitation");

        let mut attempts = 0;
        let invitation = loop {
            let code = generate_invitation_code();
            let result = sqlx::query_as::<_, InvitationEntity>(
                r#"
                INSERT INTO invitations (code, circle_id, issued_by)
                VALUES ($1, $2, $3)
                RETURNING id, code, circle_id, issued_by, used, used_by, used_at, created_at
                "#,
            )
            .bind(&code)
            .bind(circle_id)
            .bind(issuer)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(invitation) => break invitation,
                Err(e) if is_unique_violation(&e) => {
                    attempts += 1;
                    if attempts > 100 {
                        return Err(DomainError::StorageUnavailable(
                            "Could not generate a unique invitation code".into(),
                        ));
                    }
                }
                Err(e) => return Err(storage_error(e)),
            }
        };

        timer.record();
        Ok(invitation)
    }

    /// Outstanding unused codes issued by a member within a circle.
    pub async fn unused_codes(
        &self,
        circle_id: Uuid,
        issuer: Uuid,
    ) -> Result<Vec<String>, DomainError> {
        let timer = QueryTimer::new("list_unused_invitations");
        let result = retry_read(|| {
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT code FROM invitations
                WHERE circle_id = $1 AND issued_by = $2 AND NOT used
                ORDER BY created_at ASC
                "#,
            )
            .bind(circle_id)
            .bind(issuer)
            .fetch_all(&self.pool)
        })
        .await
        .map_err(storage_error);
        timer.record();
        result
    }

    /// Lazily top up a member's invitation pool.
    ///
    /// Issues fresh codes until the unused count matches the member's
    /// remaining quota. There is no lock around the deficit computation:
    /// concurrent calls may over-issue, which is tolerated; the guarantee
    /// is "at least N unused codes eventually visible", not "exactly N".
    pub async fn ensure_pool(
        &self,
        circle_id: Uuid,
        issuer: Uuid,
        remaining_invitations: i32,
    ) -> Result<Vec<String>, DomainError> {
        let mut codes = self.unused_codes(circle_id, issuer).await?;

        let deficit = pool_deficit(remaining_invitations, codes.len());
        for _ in 0..deficit {
            let invitation = self.issue(circle_id, issuer).await?;
            codes.push(invitation.code);
        }

        Ok(codes)
    }
}
