//! `PostgreSQL` stores and transactional booking services for swimdesk.
//!
//! Every store is a thin struct over a shared [`PgPool`]; rows are hydrated
//! into `swimdesk-core` types at the boundary, which is also where unknown
//! status strings are rejected. The write paths that touch shared counters
//! (booking creation, cancellation, assessment submission) run inside a
//! single sqlx transaction with row locks taken before the admission check,
//! so concurrent requests for the last seat serialize instead of racing.

#![forbid(unsafe_code)]

pub mod assessments;
pub mod bookings;
pub mod error;
pub mod invitations;
pub mod outbox;
pub mod portal;
pub mod purchase_orders;
mod rows;
pub mod sessions;
pub mod swimmers;
pub mod tasks;

pub use error::StoreError;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connection settings for the swimdesk database.
#[derive(Clone, Debug)]
pub struct PostgresSettings {
    /// Connection URL.
    pub url: String,
    /// Maximum pool size.
    pub max_connections: u32,
    /// Minimum idle connections.
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    pub connect_timeout: u64,
    /// Idle timeout in seconds.
    pub idle_timeout: u64,
}

/// Opens a connection pool with the given settings.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the pool cannot be created.
pub async fn connect(settings: &PostgresSettings) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout))
        .idle_timeout(Duration::from_secs(settings.idle_timeout))
        .connect(&settings.url)
        .await?;
    Ok(pool)
}

/// Applies the embedded migrations.
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
