//! Entities the booking logic reads and writes.
//!
//! These are plain data carriers hydrated by the storage layer. Derived
//! state (`is_full`, remaining authorization) is exposed through methods so
//! the invariant lives in exactly one place.

use crate::ids::{
    BatchId, BookingId, FundingSourceId, InstructorId, ParentId, PurchaseOrderId, SessionId,
    SwimmerId,
};
use crate::status::{BookingStatus, EnrollmentStatus, PoStatus, SessionStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The child/student record a parent manages and a booking targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swimmer {
    /// Identifier.
    pub id: SwimmerId,
    /// Owning parent account.
    pub parent_id: ParentId,
    /// Display name.
    pub name: String,
    /// Position in the enrollment pipeline.
    pub enrollment_status: EnrollmentStatus,
    /// External payer, if any.
    pub funding_source_id: Option<FundingSourceId>,
    /// Set after a late cancellation; restricts booking to one-off sessions.
    pub flexible_swimmer: bool,
    /// Level assigned at assessment, absent until one is recorded.
    pub level: Option<String>,
}

/// A scheduled, capacity-bounded time slot offered by an instructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwimSession {
    /// Identifier.
    pub id: SessionId,
    /// Instructor teaching the slot.
    pub instructor_id: InstructorId,
    /// Start of the slot (UTC).
    pub start_time: DateTime<Utc>,
    /// End of the slot (UTC).
    pub end_time: DateTime<Utc>,
    /// Seats the slot can hold.
    pub max_capacity: i32,
    /// Running count of seat-occupying bookings.
    pub booking_count: i32,
    /// Denormalized fullness flag, kept equal to `booking_count >= max_capacity`.
    pub is_full: bool,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Weekly recurring slot versus a one-off "floating" slot.
    pub is_recurring: bool,
    /// The generation batch this session came from, if any.
    pub batch_id: Option<BatchId>,
}

impl SwimSession {
    /// Computes the fullness flag from a booking count.
    #[must_use]
    pub const fn fullness(&self, booking_count: i32) -> bool {
        booking_count >= self.max_capacity
    }

    /// Whether the session can accept another booking right now.
    #[must_use]
    pub const fn accepts_bookings(&self) -> bool {
        self.status.is_bookable() && !self.is_full
    }
}

/// The join entity recording that a swimmer occupies a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Identifier.
    pub id: BookingId,
    /// The swimmer occupying the seat.
    pub swimmer_id: SwimmerId,
    /// The session being occupied.
    pub session_id: SessionId,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// When the booking was made.
    pub booked_at: DateTime<Utc>,
    /// When the booking was cancelled, if it was.
    pub canceled_at: Option<DateTime<Utc>>,
    /// Free-form cancellation reason.
    pub cancel_reason: Option<String>,
    /// Who cancelled: `"parent"` or `"staff"`.
    pub cancel_source: Option<String>,
}

/// An external payer such as a regional center.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSource {
    /// Identifier.
    pub id: FundingSourceId,
    /// Display name.
    pub name: String,
    /// Whether bookings must be covered by an approved purchase order.
    pub requires_authorization: bool,
}

/// A time-boxed authorization from a funding source permitting a fixed
/// number of sessions for one swimmer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Identifier.
    pub id: PurchaseOrderId,
    /// The swimmer this authorization covers.
    pub swimmer_id: SwimmerId,
    /// The authorizing funding source.
    pub funding_source_id: FundingSourceId,
    /// External reference number.
    pub po_number: String,
    /// Total sessions the funding source authorized.
    pub sessions_authorized: i32,
    /// Sessions consumed so far.
    pub sessions_used: i32,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window (inclusive).
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: PoStatus,
}

impl PurchaseOrder {
    /// Whether the validity window contains the given instant.
    #[must_use]
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start_date <= day && day <= self.end_date
    }

    /// Whether this PO is usable for a session starting at `at`.
    #[must_use]
    pub fn is_active_for(&self, at: DateTime<Utc>) -> bool {
        self.status == PoStatus::Approved && self.covers(at)
    }

    /// Sessions still available under this authorization.
    #[must_use]
    pub const fn remaining(&self) -> i32 {
        self.sessions_authorized - self.sessions_used
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::TimeZone;

    fn po(start: (i32, u32, u32), end: (i32, u32, u32)) -> PurchaseOrder {
        PurchaseOrder {
            id: PurchaseOrderId::new(),
            swimmer_id: SwimmerId::new(),
            funding_source_id: FundingSourceId::new(),
            po_number: "PO-1001".to_string(),
            sessions_authorized: 12,
            sessions_used: 0,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            status: PoStatus::Approved,
        }
    }

    #[test]
    fn po_window_is_inclusive_on_both_ends() {
        let po = po((2026, 1, 1), (2026, 6, 30));
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).single().unwrap();
        let last = Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).single().unwrap();
        let after = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).single().unwrap();
        assert!(po.covers(first));
        assert!(po.covers(last));
        assert!(!po.covers(after));
    }

    #[test]
    fn pending_po_is_not_active() {
        let mut po = po((2026, 1, 1), (2026, 6, 30));
        po.status = PoStatus::Pending;
        let inside = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().unwrap();
        assert!(!po.is_active_for(inside));
    }

    #[test]
    fn fullness_tracks_capacity() {
        let session = SwimSession {
            id: SessionId::new(),
            instructor_id: InstructorId::new(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            max_capacity: 4,
            booking_count: 3,
            is_full: false,
            status: SessionStatus::Available,
            is_recurring: false,
            batch_id: None,
        };
        assert!(!session.fullness(3));
        assert!(session.fullness(4));
        assert!(session.fullness(5));
    }
}
