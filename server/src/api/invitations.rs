//! Invitation claim endpoint.
//!
//! - POST /api/invitations/claim/:token - Claim an invitation (parent)
//!
//! Invitation creation is an admin operation; see [`crate::api::admin`].

use crate::auth::middleware::SessionUser;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use swimdesk_core::SwimmerId;
use swimdesk_core::admission::Requester;

/// Response after claiming an invitation.
#[derive(Debug, Serialize)]
pub struct ClaimInvitationResponse {
    /// The swimmer now linked to the claiming parent.
    pub swimmer_id: SwimmerId,
}

/// Claims an invitation token, linking the swimmer to the calling parent.
///
/// Staff sessions cannot claim invitations; the link must land on a parent
/// account.
pub async fn claim_invitation(
    State(state): State<AppState>,
    session: SessionUser,
    Path(token): Path<String>,
) -> Result<Json<ClaimInvitationResponse>, AppError> {
    let Requester::Parent(parent_id) = session.requester()? else {
        return Err(AppError::forbidden(
            "Invitations can only be claimed by a parent account",
        ));
    };
    let invitation = state.invitations.claim(&token, parent_id).await?;
    Ok(Json(ClaimInvitationResponse {
        swimmer_id: invitation.swimmer_id,
    }))
}
