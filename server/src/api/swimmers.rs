//! Swimmer endpoints.
//!
//! - GET /api/swimmers - List swimmers (parents see their own)
//! - GET /api/swimmers/analytics - Roster analytics (staff)

use crate::auth::middleware::{RequireStaff, SessionUser};
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use swimdesk_core::Swimmer;
use swimdesk_core::admission::Requester;
use swimdesk_postgres::swimmers::SwimmerAnalytics;

/// Response for listing swimmers.
#[derive(Debug, Serialize)]
pub struct ListSwimmersResponse {
    /// Matching swimmers.
    pub swimmers: Vec<Swimmer>,
}

/// Lists swimmers.
///
/// Parents see their own swimmers; staff see the full roster.
pub async fn list_swimmers(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<ListSwimmersResponse>, AppError> {
    let swimmers = match session.requester()? {
        Requester::Parent(parent_id) => state.swimmers.list_for_parent(parent_id).await?,
        Requester::Staff => state.swimmers.list_all().await?,
    };
    Ok(Json(ListSwimmersResponse { swimmers }))
}

/// Returns roster analytics: totals, enrollment-status buckets, funded and
/// flexible counts.
pub async fn swimmer_analytics(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
) -> Result<Json<SwimmerAnalytics>, AppError> {
    Ok(Json(state.swimmers.analytics().await?))
}
