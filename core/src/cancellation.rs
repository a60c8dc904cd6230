//! The 24-hour cancellation policy.
//!
//! Cancellations made at least [`SELF_SERVICE_CUTOFF_HOURS`] before the
//! session start are unrestricted. Inside the window, parent self-service is
//! blocked; staff may force the cancellation, which demotes the swimmer to
//! flexible status (single floating sessions only). The demotion is a single
//! forward transition with no automatic reversal.

use crate::status::BookingStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hours before session start after which parent self-service cancellation
/// is no longer allowed.
pub const SELF_SERVICE_CUTOFF_HOURS: i64 = 24;

/// Who is cancelling the booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelSource {
    /// The parent, through the portal.
    Parent,
    /// Staff or admin, possibly overriding the cutoff.
    Staff,
}

impl CancelSource {
    /// The text stored on the booking row.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Staff => "staff",
        }
    }
}

/// What a permitted cancellation entails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancellationDecision {
    /// Cancel the booking; no further consequences.
    Allowed,
    /// Cancel the booking and set the swimmer's `flexible_swimmer` flag.
    AllowedWithDemotion,
}

/// Why a cancellation was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CancellationError {
    /// Parents may not self-cancel inside the cutoff window.
    #[error("cancellations within {SELF_SERVICE_CUTOFF_HOURS} hours of the session require staff")]
    LateCancellation,
    /// Only confirmed bookings can be cancelled.
    #[error("booking is {0} and cannot be cancelled")]
    NotCancellable(BookingStatus),
}

/// Applies the cancellation policy.
///
/// # Errors
///
/// Returns [`CancellationError::NotCancellable`] when the booking is not
/// confirmed, and [`CancellationError::LateCancellation`] when a parent
/// attempts to cancel inside the cutoff window.
pub fn evaluate_cancellation(
    booking_status: BookingStatus,
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
    source: CancelSource,
) -> Result<CancellationDecision, CancellationError> {
    if booking_status != BookingStatus::Confirmed {
        return Err(CancellationError::NotCancellable(booking_status));
    }

    let inside_cutoff = session_start - now < Duration::hours(SELF_SERVICE_CUTOFF_HOURS);
    if !inside_cutoff {
        return Ok(CancellationDecision::Allowed);
    }

    match source {
        CancelSource::Parent => Err(CancellationError::LateCancellation),
        CancelSource::Staff => Ok(CancellationDecision::AllowedWithDemotion),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn early_parent_cancellation_is_allowed() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let decision =
            evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Parent)
                .unwrap();
        assert_eq!(decision, CancellationDecision::Allowed);
    }

    #[test]
    fn late_parent_cancellation_is_blocked() {
        let now = Utc::now();
        let start = now + Duration::hours(12);
        let err = evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Parent)
            .unwrap_err();
        assert_eq!(err, CancellationError::LateCancellation);
    }

    #[test]
    fn late_staff_cancellation_demotes() {
        let now = Utc::now();
        let start = now + Duration::hours(2);
        let decision =
            evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Staff)
                .unwrap();
        assert_eq!(decision, CancellationDecision::AllowedWithDemotion);
    }

    #[test]
    fn early_staff_cancellation_does_not_demote() {
        let now = Utc::now();
        let start = now + Duration::hours(25);
        let decision =
            evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Staff)
                .unwrap();
        assert_eq!(decision, CancellationDecision::Allowed);
    }

    #[test]
    fn exactly_at_cutoff_counts_as_early() {
        let now = Utc::now();
        let start = now + Duration::hours(SELF_SERVICE_CUTOFF_HOURS);
        let decision =
            evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Parent)
                .unwrap();
        assert_eq!(decision, CancellationDecision::Allowed);
    }

    #[test]
    fn cancelled_booking_cannot_be_cancelled_again() {
        let now = Utc::now();
        let start = now + Duration::hours(48);
        let err = evaluate_cancellation(BookingStatus::Cancelled, start, now, CancelSource::Staff)
            .unwrap_err();
        assert_eq!(
            err,
            CancellationError::NotCancellable(BookingStatus::Cancelled)
        );
    }

    #[test]
    fn session_already_started_is_late() {
        let now = Utc::now();
        let start = now - Duration::hours(1);
        let err = evaluate_cancellation(BookingStatus::Confirmed, start, now, CancelSource::Parent)
            .unwrap_err();
        assert_eq!(err, CancellationError::LateCancellation);
    }
}
