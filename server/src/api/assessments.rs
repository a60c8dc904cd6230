//! Assessment endpoints.
//!
//! - POST /api/assessments/complete - Record a completed assessment (staff)

use crate::auth::middleware::RequireStaff;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use swimdesk_core::{Swimmer, SwimmerId};
use swimdesk_postgres::assessments::{
    AssessmentOutcome, AssessmentSubmission, InitialAuthorization,
};

/// Authorization window to open alongside an approval.
#[derive(Debug, Deserialize)]
pub struct AuthorizationRequest {
    /// External reference number.
    pub po_number: String,
    /// Sessions the funding source authorized.
    pub sessions_authorized: i32,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window (inclusive).
    pub end_date: NaiveDate,
}

/// Request to record a completed assessment.
#[derive(Debug, Deserialize)]
pub struct CompleteAssessmentRequest {
    /// The assessed swimmer.
    pub swimmer_id: SwimmerId,
    /// The verdict.
    pub outcome: AssessmentOutcome,
    /// Assigned level, when approved.
    pub level: Option<String>,
    /// Assessor notes.
    pub notes: Option<String>,
    /// Initial authorization for an approved funded swimmer.
    pub authorization: Option<AuthorizationRequest>,
}

/// Response after recording an assessment.
#[derive(Debug, Serialize)]
pub struct CompleteAssessmentResponse {
    /// The swimmer with their updated enrollment status.
    pub swimmer: Swimmer,
}

/// Records a completed assessment, moving the swimmer's enrollment status
/// and opening the initial purchase order for an approved funded swimmer.
pub async fn complete_assessment(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Json(request): Json<CompleteAssessmentRequest>,
) -> Result<Json<CompleteAssessmentResponse>, AppError> {
    if let Some(authorization) = &request.authorization {
        if authorization.sessions_authorized <= 0 {
            return Err(AppError::validation("sessions_authorized must be positive"));
        }
        if authorization.end_date < authorization.start_date {
            return Err(AppError::validation("end_date precedes start_date"));
        }
    }

    let swimmer = state
        .assessments
        .submit(&AssessmentSubmission {
            swimmer_id: request.swimmer_id,
            outcome: request.outcome,
            level: request.level,
            notes: request.notes,
            authorization: request.authorization.map(|a| InitialAuthorization {
                po_number: a.po_number,
                sessions_authorized: a.sessions_authorized,
                start_date: a.start_date,
                end_date: a.end_date,
            }),
        })
        .await?;
    Ok(Json(CompleteAssessmentResponse { swimmer }))
}
