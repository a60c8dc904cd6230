//! Post-commit notification outbox.
//!
//! Write paths enqueue a row in the same transaction as the state change;
//! the server's notifier task polls for due rows, sends the email, and
//! marks the row sent. Delivery failures are retried with linear backoff
//! and parked permanently after [`MAX_ATTEMPTS`], so email can never affect
//! the outcome of the operation that produced it.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::fmt;
use std::str::FromStr;

/// Attempts before a row is parked as permanently failed.
pub const MAX_ATTEMPTS: i32 = 5;

/// Seconds added per prior attempt when scheduling a retry.
pub const RETRY_BACKOFF_SECS: i64 = 60;

/// What kind of email a row describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    /// A booking was created.
    BookingConfirmed,
    /// A booking was cancelled.
    BookingCancelled,
    /// An assessment was completed.
    AssessmentCompleted,
    /// A parent was invited to claim a swimmer.
    ParentInvitation,
    /// A pending invitation lapsed.
    InvitationExpired,
}

impl NotificationKind {
    /// The text stored on the outbox row.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingConfirmed => "booking_confirmed",
            Self::BookingCancelled => "booking_cancelled",
            Self::AssessmentCompleted => "assessment_completed",
            Self::ParentInvitation => "parent_invitation",
            Self::InvitationExpired => "invitation_expired",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = swimdesk_core::StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking_confirmed" => Ok(Self::BookingConfirmed),
            "booking_cancelled" => Ok(Self::BookingCancelled),
            "assessment_completed" => Ok(Self::AssessmentCompleted),
            "parent_invitation" => Ok(Self::ParentInvitation),
            "invitation_expired" => Ok(Self::InvitationExpired),
            other => Err(swimdesk_core::StatusParseError {
                kind: "notification",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A due outbox row handed to the notifier.
#[derive(Debug)]
pub struct OutboxMessage {
    /// Row id.
    pub id: i64,
    /// Email kind.
    pub kind: NotificationKind,
    /// Kind-specific payload captured at enqueue time.
    pub payload: serde_json::Value,
    /// Delivery attempts so far.
    pub attempts: i32,
    /// When the row was enqueued.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OutboxRow {
    id: i64,
    kind: String,
    payload: serde_json::Value,
    attempts: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for OutboxMessage {
    type Error = StoreError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            kind: row.kind.parse()?,
            payload: row.payload,
            attempts: row.attempts,
            created_at: row.created_at,
        })
    }
}

/// Enqueues a notification inside the caller's transaction.
///
/// # Errors
///
/// Returns [`StoreError::Database`] on insert failure; the caller's
/// transaction then rolls back the whole operation.
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    kind: NotificationKind,
    payload: &serde_json::Value,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO notification_outbox (kind, payload) VALUES ($1, $2)")
        .bind(kind.as_str())
        .bind(payload)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Store for draining the outbox.
#[derive(Clone)]
pub struct OutboxStore {
    pool: PgPool,
}

impl OutboxStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches rows that are due for delivery, oldest first.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so multiple notifier instances never
    /// double-send a row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure and
    /// [`StoreError::InvalidStatus`] for a row with an unknown kind.
    pub async fn fetch_due(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let rows: Vec<OutboxRow> = sqlx::query_as(
            "SELECT id, kind, payload, attempts, created_at FROM notification_outbox \
             WHERE sent_at IS NULL AND failed_at IS NULL AND next_attempt_at <= now() \
             ORDER BY id \
             LIMIT $1 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        // Push the claimed rows past the horizon so a crashed notifier only
        // delays them by one backoff interval.
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        if !ids.is_empty() {
            sqlx::query(
                "UPDATE notification_outbox \
                 SET next_attempt_at = now() + make_interval(secs => $2) \
                 WHERE id = ANY($1)",
            )
            .bind(&ids)
            .bind(RETRY_BACKOFF_SECS as f64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Marks a row as delivered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on update failure.
    pub async fn mark_sent(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE notification_outbox SET sent_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a failed attempt, scheduling a retry or parking the row once
    /// [`MAX_ATTEMPTS`] is reached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on update failure.
    pub async fn mark_failed(&self, id: i64, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE notification_outbox SET \
                 attempts = attempts + 1, \
                 last_error = $2, \
                 next_attempt_at = now() + make_interval(secs => (attempts + 1) * $3), \
                 failed_at = CASE WHEN attempts + 1 >= $4 THEN now() ELSE failed_at END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(RETRY_BACKOFF_SECS as f64)
        .bind(MAX_ATTEMPTS)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
