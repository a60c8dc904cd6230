//! Session queries and batch persistence.

use crate::error::StoreError;
use crate::rows::{SESSION_COLUMNS, SessionRow};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use swimdesk_core::slots::{ExistingSlot, GeneratedBatch};
use swimdesk_core::{BatchId, SessionId, SwimSession};
use uuid::Uuid;

/// Attributes applied to every session in a generated batch.
#[derive(Clone, Copy, Debug)]
pub struct BatchDefaults {
    /// Seats per generated session.
    pub max_capacity: i32,
    /// Whether the generated sessions are weekly recurring slots.
    pub is_recurring: bool,
}

/// Store for sessions.
#[derive(Clone)]
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches one session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn get(&self, id: SessionId) -> Result<SwimSession, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.ok_or(StoreError::NotFound("session"))?.try_into()?)
    }

    /// Lists upcoming sessions that are open for booking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_bookable(&self) -> Result<Vec<SwimSession>, StoreError> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE status = 'available' AND start_time > now() \
             ORDER BY start_time"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }

    /// Fetches the persisted slots overlapping a window, for conflict
    /// checking during generation. Cancelled sessions do not block.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn existing_slots_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExistingSlot>, StoreError> {
        let rows: Vec<(Uuid, Uuid, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, instructor_id, start_time, end_time FROM sessions \
             WHERE status <> 'cancelled' AND start_time < $2 AND end_time > $1",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, instructor_id, start_time, end_time)| ExistingSlot {
                session_id: id.into(),
                instructor_id: instructor_id.into(),
                start_time,
                end_time,
            })
            .collect())
    }

    /// Bulk-inserts a generated batch as draft sessions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure; the batch is
    /// all-or-nothing.
    pub async fn insert_batch(
        &self,
        batch: &GeneratedBatch,
        defaults: BatchDefaults,
    ) -> Result<usize, StoreError> {
        if batch.sessions.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = batch.sessions.iter().map(|_| Uuid::new_v4()).collect();
        let instructors: Vec<Uuid> = batch
            .sessions
            .iter()
            .map(|s| *s.instructor_id.as_uuid())
            .collect();
        let starts: Vec<DateTime<Utc>> = batch.sessions.iter().map(|s| s.start_time).collect();
        let ends: Vec<DateTime<Utc>> = batch.sessions.iter().map(|s| s.end_time).collect();

        sqlx::query(
            "INSERT INTO sessions \
                 (id, instructor_id, start_time, end_time, max_capacity, status, is_recurring, batch_id) \
             SELECT id, instructor_id, start_time, end_time, $5, 'draft', $6, $7 \
             FROM UNNEST($1::uuid[], $2::uuid[], $3::timestamptz[], $4::timestamptz[]) \
                 AS t(id, instructor_id, start_time, end_time)",
        )
        .bind(&ids)
        .bind(&instructors)
        .bind(&starts)
        .bind(&ends)
        .bind(defaults.max_capacity)
        .bind(defaults.is_recurring)
        .bind(batch.batch_id.as_uuid())
        .execute(&self.pool)
        .await?;

        tracing::info!(
            batch_id = %batch.batch_id,
            inserted = batch.sessions.len(),
            conflicts = batch.conflicts.len(),
            "session batch inserted"
        );
        Ok(batch.sessions.len())
    }

    /// Opens every draft session in a batch for booking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on update failure.
    pub async fn open_batch(&self, batch_id: BatchId) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE sessions SET status = 'available' WHERE batch_id = $1 AND status = 'draft'")
                .bind(batch_id.as_uuid())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Deletes a batch's sessions that never took a booking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on delete failure.
    pub async fn delete_batch(&self, batch_id: BatchId) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE batch_id = $1 AND booking_count = 0")
                .bind(batch_id.as_uuid())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
