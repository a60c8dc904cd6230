//! Domain model and booking rules for the swimdesk platform.
//!
//! This crate is pure logic: it knows nothing about HTTP, SQL, or email.
//! The storage layer (`swimdesk-postgres`) fetches rows, converts them into
//! the types defined here, and asks this crate whether an operation is
//! allowed. That split keeps every admission rule, cancellation policy, and
//! slot-generation invariant unit-testable without a database.
//!
//! # Modules
//!
//! - [`ids`]: typed identifiers (newtypes over `Uuid`)
//! - [`status`]: closed status enumerations with explicit transitions
//! - [`model`]: the entities the booking logic reads and writes
//! - [`admission`]: the booking admission check
//! - [`cancellation`]: the 24-hour cancellation policy
//! - [`slots`]: deterministic time-slot batch generation

#![forbid(unsafe_code)]

pub mod admission;
pub mod cancellation;
pub mod ids;
pub mod model;
pub mod slots;
pub mod status;

pub use admission::{AdmissionError, AdmissionRequest, BookingChannel, Requester, admit};
pub use cancellation::{
    CancelSource, CancellationDecision, CancellationError, SELF_SERVICE_CUTOFF_HOURS,
    evaluate_cancellation,
};
pub use ids::{
    BatchId, BookingId, FundingSourceId, InstructorId, InvitationId, ParentId, PurchaseOrderId,
    SessionId, SwimmerId, TaskId,
};
pub use model::{Booking, FundingSource, PurchaseOrder, Swimmer, SwimSession};
pub use status::{
    BookingStatus, EnrollmentStatus, InvitationStatus, PoStatus, SessionStatus, StatusParseError,
    TaskStatus,
};
