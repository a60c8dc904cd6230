//! Session endpoints.
//!
//! - GET /api/sessions - List bookable upcoming sessions
//! - POST /api/sessions/generate - Generate a session batch (staff)
//! - POST /api/sessions/batches/:batch_id/open - Open a batch for booking (staff)
//! - DELETE /api/sessions/batches/:batch_id - Delete an unbooked batch (staff)

use crate::auth::middleware::{RequireStaff, SessionUser};
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use swimdesk_core::slots::{BreakWindow, SlotPlan, generate_batch};
use swimdesk_core::{BatchId, InstructorId, SwimSession};
use swimdesk_postgres::sessions::BatchDefaults;

/// Response for listing sessions.
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    /// Upcoming sessions open for booking.
    pub sessions: Vec<SwimSession>,
}

/// Lists upcoming sessions that are open for booking.
pub async fn list_sessions(
    State(state): State<AppState>,
    _session: SessionUser,
) -> Result<Json<ListSessionsResponse>, AppError> {
    let sessions = state.sessions.list_bookable().await?;
    Ok(Json(ListSessionsResponse { sessions }))
}

/// A break window in a generation request.
#[derive(Debug, Deserialize)]
pub struct BreakWindowRequest {
    /// Break start.
    pub start: NaiveTime,
    /// Break end.
    pub end: NaiveTime,
}

/// Request to generate a session batch.
#[derive(Debug, Deserialize)]
pub struct GenerateSessionsRequest {
    /// First date to consider.
    pub start_date: NaiveDate,
    /// Last date to consider (inclusive).
    pub end_date: NaiveDate,
    /// Weekday names ("mon".."sun") on which slots are generated.
    pub weekdays: Vec<String>,
    /// Daily window start.
    pub day_start: NaiveTime,
    /// Daily window end.
    pub day_end: NaiveTime,
    /// Slot length in minutes.
    pub slot_minutes: u32,
    /// Windows to skip inside each day.
    #[serde(default)]
    pub breaks: Vec<BreakWindowRequest>,
    /// Dates excluded entirely.
    #[serde(default)]
    pub blackout_dates: Vec<NaiveDate>,
    /// Instructors to generate slots for.
    pub instructors: Vec<InstructorId>,
    /// Seats per generated session.
    pub max_capacity: i32,
    /// Whether the generated sessions are weekly recurring slots.
    #[serde(default)]
    pub is_recurring: bool,
}

/// A candidate skipped because the instructor was already booked.
#[derive(Debug, Serialize)]
pub struct ConflictResponse {
    /// Instructor for the skipped slot.
    pub instructor_id: InstructorId,
    /// Skipped slot start.
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// Skipped slot end.
    pub end_time: chrono::DateTime<chrono::Utc>,
}

/// Response after generating a batch.
#[derive(Debug, Serialize)]
pub struct GenerateSessionsResponse {
    /// Identifier shared by every created session.
    pub batch_id: BatchId,
    /// Sessions created as drafts.
    pub created: usize,
    /// Candidates skipped for instructor conflicts.
    pub conflicts: Vec<ConflictResponse>,
}

/// Generates a batch of draft sessions from a slot plan.
///
/// The created sessions are not bookable until the batch is opened.
pub async fn generate_sessions(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Json(request): Json<GenerateSessionsRequest>,
) -> Result<(StatusCode, Json<GenerateSessionsResponse>), AppError> {
    let weekdays = request
        .weekdays
        .iter()
        .map(|day| {
            day.parse()
                .map_err(|_| AppError::validation(format!("unknown weekday '{day}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let plan = SlotPlan {
        start_date: request.start_date,
        end_date: request.end_date,
        weekdays,
        day_start: request.day_start,
        day_end: request.day_end,
        slot_minutes: request.slot_minutes,
        breaks: request
            .breaks
            .iter()
            .map(|b| BreakWindow {
                start: b.start,
                end: b.end,
            })
            .collect(),
        blackout_dates: request.blackout_dates.iter().copied().collect::<HashSet<_>>(),
        instructors: request.instructors,
    };

    let window_start = request.start_date.and_time(request.day_start).and_utc();
    let window_end = request.end_date.and_time(request.day_end).and_utc();
    let existing = state
        .sessions
        .existing_slots_between(window_start, window_end)
        .await?;

    let batch = generate_batch(&plan, &existing).map_err(swimdesk_postgres::StoreError::from)?;
    let created = state
        .sessions
        .insert_batch(
            &batch,
            BatchDefaults {
                max_capacity: request.max_capacity,
                is_recurring: request.is_recurring,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateSessionsResponse {
            batch_id: batch.batch_id,
            created,
            conflicts: batch
                .conflicts
                .iter()
                .map(|c| ConflictResponse {
                    instructor_id: c.instructor_id,
                    start_time: c.start_time,
                    end_time: c.end_time,
                })
                .collect(),
        }),
    ))
}

/// Response after a batch-wide status change.
#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    /// The affected batch.
    pub batch_id: BatchId,
    /// Sessions affected.
    pub affected: u64,
}

/// Opens every draft session in a batch for booking.
pub async fn open_batch(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(batch_id): Path<BatchId>,
) -> Result<Json<BatchUpdateResponse>, AppError> {
    let affected = state.sessions.open_batch(batch_id).await?;
    Ok(Json(BatchUpdateResponse { batch_id, affected }))
}

/// Deletes a batch's sessions that never took a booking.
///
/// Sessions that already have bookings are left untouched.
pub async fn delete_batch(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(batch_id): Path<BatchId>,
) -> Result<Json<BatchUpdateResponse>, AppError> {
    let affected = state.sessions.delete_batch(batch_id).await?;
    Ok(Json(BatchUpdateResponse { batch_id, affected }))
}
