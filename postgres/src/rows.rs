//! Row structs shared by the store modules.
//!
//! Rows carry statuses as text; converting a row into its core type parses
//! the status strictly, so corrupt data surfaces as an error instead of
//! being treated as some default.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use swimdesk_core::status::StatusParseError;
use swimdesk_core::{Booking, FundingSource, PurchaseOrder, Swimmer, SwimSession};
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct SwimmerRow {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub enrollment_status: String,
    pub funding_source_id: Option<Uuid>,
    pub flexible_swimmer: bool,
    pub level: Option<String>,
}

impl TryFrom<SwimmerRow> for Swimmer {
    type Error = StatusParseError;

    fn try_from(row: SwimmerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            parent_id: row.parent_id.into(),
            name: row.name,
            enrollment_status: row.enrollment_status.parse()?,
            funding_source_id: row.funding_source_id.map(Into::into),
            flexible_swimmer: row.flexible_swimmer,
            level: row.level,
        })
    }
}

pub(crate) const SWIMMER_COLUMNS: &str =
    "id, parent_id, name, enrollment_status, funding_source_id, flexible_swimmer, level";

#[derive(Debug, FromRow)]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub booking_count: i32,
    pub is_full: bool,
    pub status: String,
    pub is_recurring: bool,
    pub batch_id: Option<Uuid>,
}

impl TryFrom<SessionRow> for SwimSession {
    type Error = StatusParseError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            instructor_id: row.instructor_id.into(),
            start_time: row.start_time,
            end_time: row.end_time,
            max_capacity: row.max_capacity,
            booking_count: row.booking_count,
            is_full: row.is_full,
            status: row.status.parse()?,
            is_recurring: row.is_recurring,
            batch_id: row.batch_id.map(Into::into),
        })
    }
}

pub(crate) const SESSION_COLUMNS: &str = "id, instructor_id, start_time, end_time, max_capacity, \
     booking_count, is_full, status, is_recurring, batch_id";

#[derive(Debug, FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub swimmer_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub cancel_source: Option<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StatusParseError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            swimmer_id: row.swimmer_id.into(),
            session_id: row.session_id.into(),
            status: row.status.parse()?,
            booked_at: row.booked_at,
            canceled_at: row.canceled_at,
            cancel_reason: row.cancel_reason,
            cancel_source: row.cancel_source,
        })
    }
}

pub(crate) const BOOKING_COLUMNS: &str =
    "id, swimmer_id, session_id, status, booked_at, canceled_at, cancel_reason, cancel_source";

#[derive(Debug, FromRow)]
pub(crate) struct PurchaseOrderRow {
    pub id: Uuid,
    pub swimmer_id: Uuid,
    pub funding_source_id: Uuid,
    pub po_number: String,
    pub sessions_authorized: i32,
    pub sessions_used: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl TryFrom<PurchaseOrderRow> for PurchaseOrder {
    type Error = StatusParseError;

    fn try_from(row: PurchaseOrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            swimmer_id: row.swimmer_id.into(),
            funding_source_id: row.funding_source_id.into(),
            po_number: row.po_number,
            sessions_authorized: row.sessions_authorized,
            sessions_used: row.sessions_used,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse()?,
        })
    }
}

pub(crate) const PURCHASE_ORDER_COLUMNS: &str = "id, swimmer_id, funding_source_id, po_number, \
     sessions_authorized, sessions_used, start_date, end_date, status";

#[derive(Debug, FromRow)]
pub(crate) struct FundingSourceRow {
    pub id: Uuid,
    pub name: String,
    pub requires_authorization: bool,
}

impl From<FundingSourceRow> for FundingSource {
    fn from(row: FundingSourceRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            requires_authorization: row.requires_authorization,
        }
    }
}
