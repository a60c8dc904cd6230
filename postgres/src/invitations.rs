//! Parent invitations: creation, claiming, and the overdue sweep.

use crate::error::StoreError;
use crate::outbox::{self, NotificationKind};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use swimdesk_core::status::InvitationStatus;
use swimdesk_core::{InvitationId, ParentId, SwimmerId};
use uuid::Uuid;

/// An invitation for a parent to claim a swimmer.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Invitation {
    /// Identifier.
    pub id: InvitationId,
    /// The swimmer to be claimed.
    pub swimmer_id: SwimmerId,
    /// Where the invitation was sent.
    pub email: String,
    /// Claim token embedded in the emailed link.
    pub token: String,
    /// Lifecycle status.
    pub status: InvitationStatus,
    /// When the token lapses.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: Uuid,
    swimmer_id: Uuid,
    email: String,
    token: String,
    status: String,
    expires_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = StoreError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            swimmer_id: row.swimmer_id.into(),
            email: row.email,
            token: row.token,
            status: row.status.parse().map_err(StoreError::InvalidStatus)?,
            expires_at: row.expires_at,
        })
    }
}

const INVITATION_COLUMNS: &str = "id, swimmer_id, email, token, status, expires_at";

/// Store for invitations.
#[derive(Clone)]
pub struct InvitationStore {
    pool: PgPool,
}

impl InvitationStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an invitation and enqueues the invitation email in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the swimmer is unknown and
    /// [`StoreError::Database`] on insert failure.
    pub async fn create(
        &self,
        swimmer_id: SwimmerId,
        email: &str,
        expires_at: DateTime<Utc>,
        claim_base_url: &str,
    ) -> Result<Invitation, StoreError> {
        let mut tx = self.pool.begin().await?;

        let swimmer_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM swimmers WHERE id = $1")
                .bind(swimmer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let swimmer_name = swimmer_name.ok_or(StoreError::NotFound("swimmer"))?;

        let id = InvitationId::new();
        let token = Uuid::new_v4().simple().to_string();
        let row: InvitationRow = sqlx::query_as(&format!(
            "INSERT INTO invitations (id, swimmer_id, email, token, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {INVITATION_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(swimmer_id.as_uuid())
        .bind(email)
        .bind(&token)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            NotificationKind::ParentInvitation,
            &json!({
                "email": email,
                "swimmer_name": swimmer_name,
                "claim_url": format!("{claim_base_url}/api/invitations/claim/{token}"),
                "expires_at": expires_at,
            }),
        )
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Claims an invitation, linking the swimmer to the claiming parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInvitation`] when the token is unknown,
    /// already claimed, or past its expiry.
    pub async fn claim(&self, token: &str, parent_id: ParentId) -> Result<Invitation, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<InvitationRow> = sqlx::query_as(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE token = $1 FOR UPDATE"
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;
        let invitation: Invitation = row.ok_or(StoreError::InvalidInvitation)?.try_into()?;

        if invitation.status != InvitationStatus::Pending || invitation.expires_at <= Utc::now() {
            return Err(StoreError::InvalidInvitation);
        }

        sqlx::query(
            "UPDATE invitations SET status = 'claimed', claimed_by = $2, claimed_at = now() \
             WHERE id = $1",
        )
        .bind(invitation.id.as_uuid())
        .bind(parent_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE swimmers SET parent_id = $2 WHERE id = $1")
            .bind(invitation.swimmer_id.as_uuid())
            .bind(parent_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation.id,
            swimmer_id = %invitation.swimmer_id,
            "invitation claimed"
        );
        Ok(Invitation {
            status: InvitationStatus::Claimed,
            ..invitation
        })
    }

    /// Marks lapsed pending invitations as expired, enqueuing one
    /// notification per row. Returns the number swept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn sweep_expired(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let swept: Vec<(Uuid, String)> = sqlx::query_as(
            "UPDATE invitations SET status = 'expired' \
             WHERE status = 'pending' AND expires_at <= now() \
             RETURNING swimmer_id, email",
        )
        .fetch_all(&mut *tx)
        .await?;

        for (swimmer_id, email) in &swept {
            outbox::enqueue(
                &mut tx,
                NotificationKind::InvitationExpired,
                &json!({
                    "swimmer_id": swimmer_id,
                    "email": email,
                }),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(swept.len() as u64)
    }
}
