//! Store error type.

use swimdesk_core::admission::AdmissionError;
use swimdesk_core::cancellation::CancellationError;
use swimdesk_core::slots::SlotPlanError;
use swimdesk_core::status::StatusParseError;
use thiserror::Error;

/// Errors surfaced by the storage layer.
///
/// Domain refusals (`Admission`, `Cancellation`) pass through unchanged so
/// the HTTP layer can map each kind to a precise status code; everything
/// else is an infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure at startup.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored status string is not a known variant.
    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    /// The referenced row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The booking admission check refused the request.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The cancellation policy refused the request.
    #[error(transparent)]
    Cancellation(#[from] CancellationError),

    /// The slot plan was structurally invalid.
    #[error(transparent)]
    SlotPlan(#[from] SlotPlanError),

    /// The invitation token is unknown, claimed, or expired.
    #[error("invitation token is invalid or expired")]
    InvalidInvitation,
}
