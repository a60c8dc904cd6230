//! Booking creation, cancellation, and queries.
//!
//! Both write paths run in one transaction. The session row (and the
//! swimmer's purchase orders, when funded) is locked with `FOR UPDATE`
//! before the admission check runs, so two concurrent requests for the last
//! seat serialize at the database and exactly one succeeds; the loser
//! observes the updated counters and is refused. A partial unique index on
//! confirmed (swimmer, session) pairs backstops the duplicate check.

use crate::error::StoreError;
use crate::outbox::{self, NotificationKind};
use crate::rows::{
    BOOKING_COLUMNS, BookingRow, FundingSourceRow, PURCHASE_ORDER_COLUMNS, PurchaseOrderRow,
    SESSION_COLUMNS, SWIMMER_COLUMNS, SessionRow, SwimmerRow,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use swimdesk_core::admission::{AdmissionError, AdmissionRequest, BookingChannel, Requester, admit};
use swimdesk_core::cancellation::{
    CancelSource, CancellationDecision, evaluate_cancellation,
};
use swimdesk_core::status::SessionStatus;
use swimdesk_core::{
    Booking, BookingId, FundingSource, PurchaseOrder, SessionId, Swimmer, SwimSession, SwimmerId,
};
use uuid::Uuid;

/// A request to create a booking.
#[derive(Debug)]
pub struct NewBooking {
    /// Who is booking.
    pub requester: Requester,
    /// Which flow the request came through.
    pub channel: BookingChannel,
    /// The swimmer to book.
    pub swimmer_id: SwimmerId,
    /// The target session.
    pub session_id: SessionId,
}

/// A request to cancel a booking.
#[derive(Debug)]
pub struct CancelBooking {
    /// Who is cancelling.
    pub requester: Requester,
    /// The booking to cancel.
    pub booking_id: BookingId,
    /// Parent self-service or staff override.
    pub source: CancelSource,
    /// Free-form reason recorded on the booking.
    pub reason: Option<String>,
}

/// Result of a successful booking: the new row and the session's
/// post-write state.
#[derive(Debug)]
pub struct BookingReceipt {
    /// The created booking.
    pub booking: Booking,
    /// The session after its counters were updated.
    pub session: SwimSession,
}

/// Result of a successful cancellation.
#[derive(Debug)]
pub struct CancellationReceipt {
    /// The cancelled booking.
    pub booking: Booking,
    /// The session after its counters were updated.
    pub session: SwimSession,
    /// Whether the swimmer was demoted to flexible status.
    pub swimmer_demoted: bool,
}

/// Store for bookings.
#[derive(Clone)]
pub struct BookingStore {
    pool: PgPool,
}

impl BookingStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a booking, maintaining the session and purchase-order
    /// counters in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Admission`] when any admission rule refuses the
    /// request, [`StoreError::NotFound`] for missing rows, and
    /// [`StoreError::Database`] for infrastructure failures. On error
    /// nothing is persisted.
    pub async fn create(&self, request: &NewBooking) -> Result<BookingReceipt, StoreError> {
        let mut tx = self.pool.begin().await?;

        let session = lock_session(&mut tx, request.session_id).await?;
        let swimmer = fetch_swimmer(&mut tx, request.swimmer_id).await?;
        let funding_source = fetch_funding_source(&mut tx, &swimmer).await?;
        let purchase_orders = if funding_source.is_some() {
            lock_purchase_orders(&mut tx, swimmer.id).await?
        } else {
            Vec::new()
        };

        let has_confirmed_booking: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings \
             WHERE swimmer_id = $1 AND session_id = $2 AND status = 'confirmed')",
        )
        .bind(swimmer.id.as_uuid())
        .bind(session.id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let admission = admit(&AdmissionRequest {
            requester: request.requester,
            channel: request.channel,
            swimmer: &swimmer,
            session: &session,
            funding_source: funding_source.as_ref(),
            purchase_orders: &purchase_orders,
            has_confirmed_booking,
        })?;

        let booking_id = BookingId::new();
        let booking_row: BookingRow = sqlx::query_as(&format!(
            "INSERT INTO bookings (id, swimmer_id, session_id, purchase_order_id, status) \
             VALUES ($1, $2, $3, $4, 'confirmed') \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking_id.as_uuid())
        .bind(swimmer.id.as_uuid())
        .bind(session.id.as_uuid())
        .bind(admission.purchase_order.map(|id| *id.as_uuid()))
        .fetch_one(&mut *tx)
        .await?;

        let new_count = session.booking_count + 1;
        let now_full = session.fullness(new_count);
        let new_status = if now_full {
            SessionStatus::Booked
        } else {
            session.status
        };
        sqlx::query("UPDATE sessions SET booking_count = $2, is_full = $3, status = $4 WHERE id = $1")
            .bind(session.id.as_uuid())
            .bind(new_count)
            .bind(now_full)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        if let Some(po_id) = admission.purchase_order {
            sqlx::query(
                "UPDATE purchase_orders SET \
                     sessions_used = sessions_used + 1, \
                     status = CASE WHEN sessions_used + 1 >= sessions_authorized \
                              THEN 'exhausted' ELSE status END \
                 WHERE id = $1",
            )
            .bind(po_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        let parent_email = fetch_parent_email(&mut tx, &swimmer).await?;
        outbox::enqueue(
            &mut tx,
            NotificationKind::BookingConfirmed,
            &json!({
                "booking_id": booking_id,
                "swimmer_id": swimmer.id,
                "swimmer_name": swimmer.name,
                "parent_email": parent_email,
                "session_start": session.start_time,
                "session_end": session.end_time,
            }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            swimmer_id = %swimmer.id,
            session_id = %session.id,
            booking_count = new_count,
            is_full = now_full,
            "booking created"
        );

        let session = SwimSession {
            booking_count: new_count,
            is_full: now_full,
            status: new_status,
            ..session
        };
        Ok(BookingReceipt {
            booking: booking_row.try_into()?,
            session,
        })
    }

    /// Cancels a booking under the 24-hour policy, restoring the session
    /// and purchase-order counters in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancellation`] when the policy refuses the
    /// request and [`StoreError::Admission`] (`NotAuthorized`) when a parent
    /// targets a booking they do not own.
    pub async fn cancel(&self, request: &CancelBooking) -> Result<CancellationReceipt, StoreError> {
        let mut tx = self.pool.begin().await?;

        let booking_row: BookingRow = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(request.booking_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("booking"))?;
        let booking: Booking = booking_row.try_into()?;

        let charged_po: Option<Uuid> =
            sqlx::query_scalar("SELECT purchase_order_id FROM bookings WHERE id = $1")
                .bind(booking.id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

        let session = lock_session(&mut tx, booking.session_id).await?;
        let swimmer = fetch_swimmer(&mut tx, booking.swimmer_id).await?;

        if let Requester::Parent(parent_id) = request.requester {
            if swimmer.parent_id != parent_id {
                return Err(AdmissionError::NotAuthorized.into());
            }
        }

        let decision = evaluate_cancellation(
            booking.status,
            session.start_time,
            Utc::now(),
            request.source,
        )?;

        let cancelled_row: BookingRow = sqlx::query_as(&format!(
            "UPDATE bookings SET status = 'cancelled', canceled_at = now(), \
                 cancel_reason = $2, cancel_source = $3 \
             WHERE id = $1 \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id.as_uuid())
        .bind(request.reason.as_deref())
        .bind(request.source.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let new_count = (session.booking_count - 1).max(0);
        let now_full = session.fullness(new_count);
        let new_status = if session.status == SessionStatus::Booked && !now_full {
            SessionStatus::Available
        } else {
            session.status
        };
        sqlx::query("UPDATE sessions SET booking_count = $2, is_full = $3, status = $4 WHERE id = $1")
            .bind(session.id.as_uuid())
            .bind(new_count)
            .bind(now_full)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        if let Some(po_id) = charged_po {
            sqlx::query(
                "UPDATE purchase_orders SET \
                     sessions_used = GREATEST(sessions_used - 1, 0), \
                     status = CASE WHEN status = 'exhausted' THEN 'approved' ELSE status END \
                 WHERE id = $1",
            )
            .bind(po_id)
            .execute(&mut *tx)
            .await?;
        }

        let swimmer_demoted = decision == CancellationDecision::AllowedWithDemotion;
        if swimmer_demoted {
            sqlx::query("UPDATE swimmers SET flexible_swimmer = TRUE WHERE id = $1")
                .bind(swimmer.id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        let parent_email = fetch_parent_email(&mut tx, &swimmer).await?;
        outbox::enqueue(
            &mut tx,
            NotificationKind::BookingCancelled,
            &json!({
                "booking_id": booking.id,
                "swimmer_id": swimmer.id,
                "swimmer_name": swimmer.name,
                "parent_email": parent_email,
                "session_start": session.start_time,
                "cancel_source": request.source.as_str(),
                "swimmer_demoted": swimmer_demoted,
            }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            session_id = %session.id,
            demoted = swimmer_demoted,
            "booking cancelled"
        );

        let session = SwimSession {
            booking_count: new_count,
            is_full: now_full,
            status: new_status,
            ..session
        };
        Ok(CancellationReceipt {
            booking: cancelled_row.try_into()?,
            session,
            swimmer_demoted,
        })
    }

    /// Lists bookings belonging to one parent's swimmers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_for_parent(
        &self,
        parent_id: swimdesk_core::ParentId,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT b.{} FROM bookings b \
             JOIN swimmers s ON s.id = b.swimmer_id \
             WHERE s.parent_id = $1 \
             ORDER BY b.booked_at DESC",
            BOOKING_COLUMNS.replace(", ", ", b.")
        ))
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }

    /// Lists all bookings, optionally filtered to one session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_all(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = match session_id {
            Some(id) => {
                sqlx::query_as(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE session_id = $1 \
                     ORDER BY booked_at DESC"
                ))
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booked_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter()
            .map(|row| row.try_into().map_err(StoreError::from))
            .collect()
    }
}

async fn lock_session(
    tx: &mut Transaction<'_, Postgres>,
    session_id: SessionId,
) -> Result<SwimSession, StoreError> {
    let row: Option<SessionRow> = sqlx::query_as(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE"
    ))
    .bind(session_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.ok_or(StoreError::NotFound("session"))?.try_into()?)
}

async fn fetch_swimmer(
    tx: &mut Transaction<'_, Postgres>,
    swimmer_id: SwimmerId,
) -> Result<Swimmer, StoreError> {
    let row: Option<SwimmerRow> = sqlx::query_as(&format!(
        "SELECT {SWIMMER_COLUMNS} FROM swimmers WHERE id = $1"
    ))
    .bind(swimmer_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.ok_or(StoreError::NotFound("swimmer"))?.try_into()?)
}

async fn fetch_funding_source(
    tx: &mut Transaction<'_, Postgres>,
    swimmer: &Swimmer,
) -> Result<Option<FundingSource>, StoreError> {
    let Some(funding_source_id) = swimmer.funding_source_id else {
        return Ok(None);
    };
    let row: Option<FundingSourceRow> = sqlx::query_as(
        "SELECT id, name, requires_authorization FROM funding_sources WHERE id = $1",
    )
    .bind(funding_source_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await?;
    Ok(Some(
        row.ok_or(StoreError::NotFound("funding source"))?.into(),
    ))
}

async fn lock_purchase_orders(
    tx: &mut Transaction<'_, Postgres>,
    swimmer_id: SwimmerId,
) -> Result<Vec<PurchaseOrder>, StoreError> {
    let rows: Vec<PurchaseOrderRow> = sqlx::query_as(&format!(
        "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders \
         WHERE swimmer_id = $1 ORDER BY start_date FOR UPDATE"
    ))
    .bind(swimmer_id.as_uuid())
    .fetch_all(&mut **tx)
    .await?;
    rows.into_iter()
        .map(|row| row.try_into().map_err(StoreError::from))
        .collect()
}

async fn fetch_parent_email(
    tx: &mut Transaction<'_, Postgres>,
    swimmer: &Swimmer,
) -> Result<String, StoreError> {
    let email: Option<String> = sqlx::query_scalar("SELECT email FROM parents WHERE id = $1")
        .bind(swimmer.parent_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;
    email.ok_or(StoreError::NotFound("parent"))
}
