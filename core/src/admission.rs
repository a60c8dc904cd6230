//! The booking admission check.
//!
//! Decides whether a (swimmer, session) pair may produce a new booking. The
//! check is a pure function over records the storage layer has already
//! fetched (and, on the write path, locked), so the same rules back both the
//! transactional booking service and the unit tests in this module.
//!
//! Checks run in a fixed order and short-circuit on the first failure; each
//! failure maps to a distinct [`AdmissionError`] kind so the HTTP layer can
//! report a precise status code.

use crate::ids::{ParentId, PurchaseOrderId};
use crate::model::{FundingSource, PurchaseOrder, Swimmer, SwimSession};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who is asking to book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requester {
    /// A parent booking for one of their own swimmers.
    Parent(ParentId),
    /// Staff or admin acting on any swimmer.
    Staff,
}

/// Which booking flow the request arrived through.
///
/// Recurring weekly slots must be booked through the recurring flow and
/// one-off floating slots through the single-lesson flow; crossing the
/// streams is rejected rather than silently accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingChannel {
    /// One-off floating-slot booking.
    Single,
    /// Weekly recurring booking.
    Recurring,
}

/// Everything the admission check needs, pre-fetched by the caller.
#[derive(Debug)]
pub struct AdmissionRequest<'a> {
    /// Who is asking.
    pub requester: Requester,
    /// Which flow the request came through.
    pub channel: BookingChannel,
    /// The swimmer to book.
    pub swimmer: &'a Swimmer,
    /// The target session.
    pub session: &'a SwimSession,
    /// The swimmer's funding source, when one is attached.
    pub funding_source: Option<&'a FundingSource>,
    /// All purchase orders on file for the swimmer.
    pub purchase_orders: &'a [PurchaseOrder],
    /// Whether a confirmed booking already links this swimmer to this session.
    pub has_confirmed_booking: bool,
}

/// Outcome of a successful admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    /// The purchase order to charge, when the swimmer is funded.
    pub purchase_order: Option<PurchaseOrderId>,
}

/// Why a booking was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// The swimmer does not belong to the requesting parent.
    #[error("swimmer does not belong to the requesting account")]
    NotAuthorized,
    /// The session is not open for booking or is already full.
    #[error("session is not available for booking")]
    SessionUnavailable,
    /// The swimmer's enrollment status does not permit booking.
    #[error("swimmer is not enrolled")]
    NotEnrolled,
    /// Recurring sessions must go through the recurring flow and vice versa.
    #[error("session must be booked through the {expected} flow")]
    WrongBookingChannel {
        /// The flow that would accept this session.
        expected: BookingChannel,
    },
    /// A flexible swimmer may only book one-off floating sessions.
    #[error("flexible swimmers may only book single floating sessions")]
    FlexibleRestricted,
    /// No approved purchase order covers the session date.
    #[error("no active purchase order covers this session")]
    NoAuthorization,
    /// The covering purchase order has no sessions left.
    #[error("purchase order authorization is exhausted")]
    AuthorizationExhausted,
    /// The swimmer already holds a confirmed booking for this session.
    #[error("swimmer already has a confirmed booking for this session")]
    DuplicateBooking,
}

impl std::fmt::Display for BookingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => f.write_str("single-lesson"),
            Self::Recurring => f.write_str("recurring"),
        }
    }
}

/// Runs the admission check.
///
/// # Errors
///
/// Returns the first failing [`AdmissionError`], in check order: ownership,
/// session availability, enrollment, booking channel, flexible-swimmer
/// restriction, funding authorization, duplicate booking.
pub fn admit(request: &AdmissionRequest<'_>) -> Result<Admission, AdmissionError> {
    let swimmer = request.swimmer;
    let session = request.session;

    if let Requester::Parent(parent_id) = request.requester {
        if swimmer.parent_id != parent_id {
            return Err(AdmissionError::NotAuthorized);
        }
    }

    if !session.accepts_bookings() {
        return Err(AdmissionError::SessionUnavailable);
    }

    if !swimmer.enrollment_status.can_book_lessons() {
        return Err(AdmissionError::NotEnrolled);
    }

    match (request.channel, session.is_recurring) {
        (BookingChannel::Single, true) => {
            return Err(AdmissionError::WrongBookingChannel {
                expected: BookingChannel::Recurring,
            });
        }
        (BookingChannel::Recurring, false) => {
            return Err(AdmissionError::WrongBookingChannel {
                expected: BookingChannel::Single,
            });
        }
        _ => {}
    }

    if swimmer.flexible_swimmer && session.is_recurring {
        return Err(AdmissionError::FlexibleRestricted);
    }

    let purchase_order = match (swimmer.funding_source_id, request.funding_source) {
        (Some(funding_source_id), Some(source)) if source.requires_authorization => {
            Some(charged_purchase_order(
                request.purchase_orders,
                funding_source_id,
                session,
            )?)
        }
        _ => None,
    };

    if request.has_confirmed_booking {
        return Err(AdmissionError::DuplicateBooking);
    }

    Ok(Admission { purchase_order })
}

/// Picks the purchase order a funded booking will consume.
fn charged_purchase_order(
    purchase_orders: &[PurchaseOrder],
    funding_source_id: crate::ids::FundingSourceId,
    session: &SwimSession,
) -> Result<PurchaseOrderId, AdmissionError> {
    let mut covering = purchase_orders
        .iter()
        .filter(|po| po.funding_source_id == funding_source_id)
        .filter(|po| po.is_active_for(session.start_time))
        .peekable();

    if covering.peek().is_none() {
        return Err(AdmissionError::NoAuthorization);
    }

    covering
        .find(|po| po.remaining() > 0)
        .map(|po| po.id)
        .ok_or(AdmissionError::AuthorizationExhausted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::ids::{FundingSourceId, InstructorId, SessionId, SwimmerId};
    use crate::status::{EnrollmentStatus, PoStatus, SessionStatus};
    use chrono::{Duration, NaiveDate, Utc};

    fn swimmer(parent_id: ParentId) -> Swimmer {
        Swimmer {
            id: SwimmerId::new(),
            parent_id,
            name: "Avery".to_string(),
            enrollment_status: EnrollmentStatus::Enrolled,
            funding_source_id: None,
            flexible_swimmer: false,
            level: None,
        }
    }

    fn session() -> SwimSession {
        let start = Utc::now() + Duration::days(7);
        SwimSession {
            id: SessionId::new(),
            instructor_id: InstructorId::new(),
            start_time: start,
            end_time: start + Duration::minutes(30),
            max_capacity: 4,
            booking_count: 0,
            is_full: false,
            status: SessionStatus::Available,
            is_recurring: false,
            batch_id: None,
        }
    }

    fn request<'a>(
        parent_id: ParentId,
        swimmer: &'a Swimmer,
        session: &'a SwimSession,
    ) -> AdmissionRequest<'a> {
        AdmissionRequest {
            requester: Requester::Parent(parent_id),
            channel: BookingChannel::Single,
            swimmer,
            session,
            funding_source: None,
            purchase_orders: &[],
            has_confirmed_booking: false,
        }
    }

    fn approved_po(
        swimmer: &Swimmer,
        funding_source_id: FundingSourceId,
        authorized: i32,
        used: i32,
    ) -> PurchaseOrder {
        let today = Utc::now().date_naive();
        PurchaseOrder {
            id: crate::ids::PurchaseOrderId::new(),
            swimmer_id: swimmer.id,
            funding_source_id,
            po_number: "PO-77".to_string(),
            sessions_authorized: authorized,
            sessions_used: used,
            start_date: today - chrono::Days::new(30),
            end_date: today + chrono::Days::new(60),
            status: PoStatus::Approved,
        }
    }

    #[test]
    fn plain_enrolled_swimmer_is_admitted() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let session = session();
        let admission = admit(&request(parent, &swimmer, &session)).unwrap();
        assert_eq!(admission.purchase_order, None);
    }

    #[test]
    fn other_parents_swimmer_is_rejected() {
        let swimmer = swimmer(ParentId::new());
        let session = session();
        let err = admit(&request(ParentId::new(), &swimmer, &session)).unwrap_err();
        assert_eq!(err, AdmissionError::NotAuthorized);
    }

    #[test]
    fn staff_bypasses_ownership() {
        let swimmer = swimmer(ParentId::new());
        let session = session();
        let mut req = request(ParentId::new(), &swimmer, &session);
        req.requester = Requester::Staff;
        assert!(admit(&req).is_ok());
    }

    #[test]
    fn full_session_is_unavailable() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let mut session = session();
        session.booking_count = session.max_capacity;
        session.is_full = true;
        let err = admit(&request(parent, &swimmer, &session)).unwrap_err();
        assert_eq!(err, AdmissionError::SessionUnavailable);
    }

    #[test]
    fn draft_session_is_unavailable() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let mut session = session();
        session.status = SessionStatus::Draft;
        let err = admit(&request(parent, &swimmer, &session)).unwrap_err();
        assert_eq!(err, AdmissionError::SessionUnavailable);
    }

    #[test]
    fn waitlisted_swimmer_cannot_book() {
        let parent = ParentId::new();
        let mut swimmer = swimmer(parent);
        swimmer.enrollment_status = EnrollmentStatus::Waitlist;
        let session = session();
        let err = admit(&request(parent, &swimmer, &session)).unwrap_err();
        assert_eq!(err, AdmissionError::NotEnrolled);
    }

    #[test]
    fn recurring_session_rejected_on_single_channel() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let mut session = session();
        session.is_recurring = true;
        let err = admit(&request(parent, &swimmer, &session)).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::WrongBookingChannel {
                expected: BookingChannel::Recurring
            }
        );
    }

    #[test]
    fn floating_session_rejected_on_recurring_channel() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let session = session();
        let mut req = request(parent, &swimmer, &session);
        req.channel = BookingChannel::Recurring;
        let err = admit(&req).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::WrongBookingChannel {
                expected: BookingChannel::Single
            }
        );
    }

    #[test]
    fn flexible_swimmer_cannot_book_recurring() {
        let parent = ParentId::new();
        let mut swimmer = swimmer(parent);
        swimmer.flexible_swimmer = true;
        let mut session = session();
        session.is_recurring = true;
        let mut req = request(parent, &swimmer, &session);
        req.channel = BookingChannel::Recurring;
        let err = admit(&req).unwrap_err();
        assert_eq!(err, AdmissionError::FlexibleRestricted);
    }

    #[test]
    fn flexible_swimmer_can_still_book_single() {
        let parent = ParentId::new();
        let mut swimmer = swimmer(parent);
        swimmer.flexible_swimmer = true;
        let session = session();
        assert!(admit(&request(parent, &swimmer, &session)).is_ok());
    }

    #[test]
    fn funded_swimmer_without_po_is_rejected() {
        let parent = ParentId::new();
        let funding_source_id = FundingSourceId::new();
        let mut swimmer = swimmer(parent);
        swimmer.funding_source_id = Some(funding_source_id);
        let session = session();
        let source = FundingSource {
            id: funding_source_id,
            name: "Regional Center".to_string(),
            requires_authorization: true,
        };
        let mut req = request(parent, &swimmer, &session);
        req.funding_source = Some(&source);
        let err = admit(&req).unwrap_err();
        assert_eq!(err, AdmissionError::NoAuthorization);
    }

    #[test]
    fn exhausted_po_is_rejected() {
        let parent = ParentId::new();
        let funding_source_id = FundingSourceId::new();
        let mut swimmer = swimmer(parent);
        swimmer.funding_source_id = Some(funding_source_id);
        let session = session();
        let source = FundingSource {
            id: funding_source_id,
            name: "Regional Center".to_string(),
            requires_authorization: true,
        };
        let pos = vec![approved_po(&swimmer, funding_source_id, 12, 12)];
        let mut req = request(parent, &swimmer, &session);
        req.funding_source = Some(&source);
        req.purchase_orders = &pos;
        let err = admit(&req).unwrap_err();
        assert_eq!(err, AdmissionError::AuthorizationExhausted);
    }

    #[test]
    fn funded_swimmer_with_remaining_sessions_is_admitted() {
        let parent = ParentId::new();
        let funding_source_id = FundingSourceId::new();
        let mut swimmer = swimmer(parent);
        swimmer.funding_source_id = Some(funding_source_id);
        let session = session();
        let source = FundingSource {
            id: funding_source_id,
            name: "Regional Center".to_string(),
            requires_authorization: true,
        };
        let pos = vec![approved_po(&swimmer, funding_source_id, 12, 11)];
        let mut req = request(parent, &swimmer, &session);
        req.funding_source = Some(&source);
        req.purchase_orders = &pos;
        let admission = admit(&req).unwrap();
        assert_eq!(admission.purchase_order, Some(pos[0].id));
    }

    #[test]
    fn funding_source_without_authorization_needs_no_po() {
        let parent = ParentId::new();
        let funding_source_id = FundingSourceId::new();
        let mut swimmer = swimmer(parent);
        swimmer.funding_source_id = Some(funding_source_id);
        let session = session();
        let source = FundingSource {
            id: funding_source_id,
            name: "Private Pay Plus".to_string(),
            requires_authorization: false,
        };
        let mut req = request(parent, &swimmer, &session);
        req.funding_source = Some(&source);
        let admission = admit(&req).unwrap();
        assert_eq!(admission.purchase_order, None);
    }

    #[test]
    fn duplicate_booking_is_rejected() {
        let parent = ParentId::new();
        let swimmer = swimmer(parent);
        let session = session();
        let mut req = request(parent, &swimmer, &session);
        req.has_confirmed_booking = true;
        let err = admit(&req).unwrap_err();
        assert_eq!(err, AdmissionError::DuplicateBooking);
    }

    #[test]
    fn expired_window_po_does_not_authorize() {
        let parent = ParentId::new();
        let funding_source_id = FundingSourceId::new();
        let mut swimmer = swimmer(parent);
        swimmer.funding_source_id = Some(funding_source_id);
        let session = session();
        let source = FundingSource {
            id: funding_source_id,
            name: "Regional Center".to_string(),
            requires_authorization: true,
        };
        let mut po = approved_po(&swimmer, funding_source_id, 12, 0);
        po.start_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        po.end_date = NaiveDate::from_ymd_opt(2020, 6, 30).unwrap();
        let pos = vec![po];
        let mut req = request(parent, &swimmer, &session);
        req.funding_source = Some(&source);
        req.purchase_orders = &pos;
        let err = admit(&req).unwrap_err();
        assert_eq!(err, AdmissionError::NoAuthorization);
    }
}
