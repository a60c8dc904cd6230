//! Booking endpoints.
//!
//! - POST /api/bookings - Book a recurring session
//! - POST /api/bookings/single - Book a one-off session
//! - POST /api/bookings/:id/cancel - Cancel a booking
//! - GET /api/bookings - List bookings (parents see their own)

use crate::auth::middleware::SessionUser;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use swimdesk_core::admission::{BookingChannel, Requester};
use swimdesk_core::cancellation::CancelSource;
use swimdesk_core::{Booking, BookingId, SessionId, SwimSession, SwimmerId};
use swimdesk_postgres::bookings::{CancelBooking, NewBooking};

/// Request to create a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// The swimmer to book.
    pub swimmer_id: SwimmerId,
    /// The target session.
    pub session_id: SessionId,
}

/// Response after creating a booking.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// The created or updated booking.
    pub booking: Booking,
    /// The session's state after the write.
    pub session: SwimSession,
}

async fn create_booking(
    state: &AppState,
    session: &SessionUser,
    channel: BookingChannel,
    request: &CreateBookingRequest,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let receipt = state
        .bookings
        .create(&NewBooking {
            requester: session.requester()?,
            channel,
            swimmer_id: request.swimmer_id,
            session_id: request.session_id,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking: receipt.booking,
            session: receipt.session,
        }),
    ))
}

/// Books a swimmer into a recurring weekly session.
pub async fn create_recurring_booking(
    State(state): State<AppState>,
    session: SessionUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    create_booking(&state, &session, BookingChannel::Recurring, &request).await
}

/// Books a swimmer into a one-off floating session.
pub async fn create_single_booking(
    State(state): State<AppState>,
    session: SessionUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    create_booking(&state, &session, BookingChannel::Single, &request).await
}

/// Request to cancel a booking.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    /// Free-form reason recorded on the booking.
    pub reason: Option<String>,
}

/// Response after cancelling a booking.
#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    /// The cancelled booking.
    pub booking: Booking,
    /// The session's state after the seat was released.
    pub session: SwimSession,
    /// Whether the swimmer was demoted to flexible status.
    pub swimmer_demoted: bool,
}

/// Cancels a booking under the 24-hour policy.
///
/// Parents may only cancel bookings for their own swimmers, and only
/// outside the cutoff window; staff cancellations inside the window demote
/// the swimmer to flexible status.
pub async fn cancel_booking(
    State(state): State<AppState>,
    session: SessionUser,
    Path(booking_id): Path<BookingId>,
    body: Option<Json<CancelBookingRequest>>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let requester = session.requester()?;
    let source = match requester {
        Requester::Parent(_) => CancelSource::Parent,
        Requester::Staff => CancelSource::Staff,
    };
    let reason = body.and_then(|Json(request)| request.reason);
    let receipt = state
        .bookings
        .cancel(&CancelBooking {
            requester,
            booking_id,
            source,
            reason,
        })
        .await?;
    Ok(Json(CancelBookingResponse {
        booking: receipt.booking,
        session: receipt.session,
        swimmer_demoted: receipt.swimmer_demoted,
    }))
}

/// Query parameters for listing bookings.
#[derive(Debug, Default, Deserialize)]
pub struct ListBookingsQuery {
    /// Staff-only filter to one session.
    pub session_id: Option<SessionId>,
}

/// Response for listing bookings.
#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    /// Matching bookings, newest first.
    pub bookings: Vec<Booking>,
}

/// Lists bookings.
///
/// Parents see bookings for their own swimmers; staff see everything,
/// optionally filtered to one session.
pub async fn list_bookings(
    State(state): State<AppState>,
    session: SessionUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<ListBookingsResponse>, AppError> {
    let bookings = match session.requester()? {
        Requester::Parent(parent_id) => state.bookings.list_for_parent(parent_id).await?,
        Requester::Staff => state.bookings.list_all(query.session_id).await?,
    };
    Ok(Json(ListBookingsResponse { bookings }))
}
