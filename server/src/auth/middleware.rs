//! Axum extractors for portal sessions.
//!
//! - [`BearerToken`]: raw token from the `Authorization` header
//! - [`SessionUser`]: validated portal session (parent, staff, or admin)
//! - [`RequireStaff`] / [`RequireAdmin`]: role gates
//!
//! A testing-only bypass token (`PORTAL_TEST_TOKEN`) resolves to an admin
//! session so automated tests can exercise protected endpoints without a
//! seeded portal session row.

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use swimdesk_core::ParentId;
use swimdesk_core::admission::Requester;
use swimdesk_postgres::portal::{PortalRole, PortalSession};

/// Bearer token extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token))
    }
}

/// Authenticated portal user.
///
/// Use as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The session's role.
    pub role: PortalRole,
    /// The parent account, absent for staff/admin tokens.
    pub parent_id: Option<ParentId>,
}

impl SessionUser {
    /// Converts the session into an admission-check requester.
    ///
    /// # Errors
    ///
    /// Returns 401 for a parent session with no linked account, which
    /// indicates a corrupt portal session row.
    pub fn requester(&self) -> Result<Requester, AppError> {
        match self.role {
            PortalRole::Parent => self
                .parent_id
                .map(Requester::Parent)
                .ok_or_else(|| AppError::unauthorized("Parent session has no linked account")),
            PortalRole::Staff | PortalRole::Admin => Ok(Requester::Staff),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;

        if let Some(test_token) = &state.config.test_token {
            if &bearer.0 == test_token {
                let session = PortalSession {
                    parent_id: None,
                    role: PortalRole::Admin,
                    expires_at: Utc::now() + Duration::hours(1),
                };
                return Ok(Self {
                    role: session.role,
                    parent_id: session.parent_id,
                });
            }
        }

        let session = state
            .portal
            .lookup(&bearer.0)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired session"))?;

        Ok(Self {
            role: session.role,
            parent_id: session.parent_id,
        })
    }
}

/// Requires a staff or admin session.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if !session.role.is_staff() {
            return Err(AppError::forbidden("Staff access required"));
        }
        Ok(Self(session))
    }
}

/// Requires an admin session.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if session.role != PortalRole::Admin {
            return Err(AppError::forbidden("Admin access required"));
        }
        Ok(Self(session))
    }
}
