//! Admin endpoints.
//!
//! - POST /api/admin/swimmers/:id/invite-parent - Invite a parent to claim
//!   a swimmer (admin)

use crate::auth::middleware::RequireAdmin;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use swimdesk_core::{InvitationId, SwimmerId};

/// Request to invite a parent.
#[derive(Debug, Deserialize)]
pub struct InviteParentRequest {
    /// Where to send the invitation.
    pub email: String,
}

/// Response after creating an invitation.
#[derive(Debug, Serialize)]
pub struct InviteParentResponse {
    /// The created invitation.
    pub invitation_id: InvitationId,
    /// When the token lapses.
    pub expires_at: DateTime<Utc>,
}

/// Invites a parent to claim a swimmer.
///
/// The invitation email is enqueued in the same transaction as the
/// invitation row and delivered by the notifier.
pub async fn invite_parent(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(swimmer_id): Path<SwimmerId>,
    Json(request): Json<InviteParentRequest>,
) -> Result<(StatusCode, Json<InviteParentResponse>), AppError> {
    if !request.email.contains('@') {
        return Err(AppError::validation("email address is invalid"));
    }
    let expires_at = Utc::now() + Duration::hours(state.config.invitation_ttl_hours);
    let invitation = state
        .invitations
        .create(swimmer_id, &request.email, expires_at, &state.config.base_url)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(InviteParentResponse {
            invitation_id: invitation.id,
            expires_at: invitation.expires_at,
        }),
    ))
}
