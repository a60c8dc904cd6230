//! Portal session lookup for the HTTP auth layer.
//!
//! Authentication itself is delegated to the managed identity provider;
//! this store only resolves a bearer token to the portal session it minted.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use swimdesk_core::ParentId;
use uuid::Uuid;

/// Role attached to a portal session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalRole {
    /// A parent managing their own swimmers.
    Parent,
    /// Front-desk or instructor staff.
    Staff,
    /// Administrator.
    Admin,
}

impl PortalRole {
    /// Whether this role carries staff privileges.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl std::str::FromStr for PortalRole {
    type Err = swimdesk_core::StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Self::Parent),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            other => Err(swimdesk_core::StatusParseError {
                kind: "portal role",
                value: other.to_string(),
            }),
        }
    }
}

/// A resolved portal session.
#[derive(Clone, Debug)]
pub struct PortalSession {
    /// The parent account, absent for staff/admin tokens.
    pub parent_id: Option<ParentId>,
    /// The session's role.
    pub role: PortalRole,
    /// When the session lapses.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PortalSessionRow {
    parent_id: Option<Uuid>,
    role: String,
    expires_at: DateTime<Utc>,
}

/// Store for portal sessions.
#[derive(Clone)]
pub struct PortalStore {
    pool: PgPool,
}

impl PortalStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves a bearer token to its unexpired portal session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure; an unknown or
    /// expired token resolves to `None`, not an error.
    pub async fn lookup(&self, token: &str) -> Result<Option<PortalSession>, StoreError> {
        let row: Option<PortalSessionRow> = sqlx::query_as(
            "SELECT parent_id, role, expires_at FROM portal_sessions \
             WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(PortalSession {
                parent_id: row.parent_id.map(Into::into),
                role: row.role.parse().map_err(StoreError::InvalidStatus)?,
                expires_at: row.expires_at,
            })
        })
        .transpose()
    }
}
