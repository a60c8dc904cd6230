//! Swimmer queries and analytics.

use crate::error::StoreError;
use crate::rows::{SWIMMER_COLUMNS, SwimmerRow};
use sqlx::PgPool;
use swimdesk_core::status::EnrollmentStatus;
use swimdesk_core::{ParentId, Swimmer, SwimmerId};

/// Roll-up counts over the swimmer roster.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SwimmerAnalytics {
    /// Total swimmers on file.
    pub total: i64,
    /// Count per enrollment status.
    pub by_status: Vec<StatusCount>,
    /// Swimmers attached to a funding source.
    pub funded: i64,
    /// Swimmers demoted to flexible status.
    pub flexible: i64,
}

/// One enrollment-status bucket.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StatusCount {
    /// The status.
    pub status: EnrollmentStatus,
    /// Swimmers currently in it.
    pub count: i64,
}

/// Store for swimmers.
#[derive(Clone)]
pub struct SwimmerStore {
    pool: PgPool,
}

impl SwimmerStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches one swimmer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn get(&self, id: SwimmerId) -> Result<Swimmer, StoreError> {
        let row: Option<SwimmerRow> = sqlx::query_as(&format!(
            "SELECT {SWIMMER_COLUMNS} FROM swimmers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.ok_or(StoreError::NotFound("swimmer"))?.try_into()?)
    }

    /// Lists the swimmers owned by one parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_for_parent(&self, parent_id: ParentId) -> Result<Vec<Swimmer>, StoreError> {
        let rows: Vec<SwimmerRow> = sqlx::query_as(&format!(
            "SELECT {SWIMMER_COLUMNS} FROM swimmers WHERE parent_id = $1 ORDER BY name"
        ))
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }

    /// Lists the full roster.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_all(&self) -> Result<Vec<Swimmer>, StoreError> {
        let rows: Vec<SwimmerRow> = sqlx::query_as(&format!(
            "SELECT {SWIMMER_COLUMNS} FROM swimmers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }

    /// Computes roster analytics in one round trip per aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure and
    /// [`StoreError::InvalidStatus`] if a stored status is unknown.
    pub async fn analytics(&self) -> Result<SwimmerAnalytics, StoreError> {
        let buckets: Vec<(String, i64)> = sqlx::query_as(
            "SELECT enrollment_status, COUNT(*) FROM swimmers \
             GROUP BY enrollment_status ORDER BY enrollment_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let (funded, flexible): (i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE funding_source_id IS NOT NULL), \
                 COUNT(*) FILTER (WHERE flexible_swimmer) \
             FROM swimmers",
        )
        .fetch_one(&self.pool)
        .await?;

        let mut total = 0;
        let mut by_status = Vec::with_capacity(buckets.len());
        for (status, count) in buckets {
            total += count;
            by_status.push(StatusCount {
                status: status.parse()?,
                count,
            });
        }

        Ok(SwimmerAnalytics {
            total,
            by_status,
            funded,
            flexible,
        })
    }
}
