//! Error types for HTTP handlers.
//!
//! [`AppError`] bridges store/domain errors and HTTP responses through
//! Axum's `IntoResponse`. Domain refusals keep their distinct error codes;
//! infrastructure failures collapse into a generic 500 with the detail
//! logged server-side, never leaked to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use swimdesk_core::admission::AdmissionError;
use swimdesk_core::cancellation::CancellationError;
use swimdesk_postgres::StoreError;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code.
    status: StatusCode,
    /// Error message (user-facing).
    message: String,
    /// Error code (for client error handling).
    code: String,
    /// Internal error (for logging, not exposed to the client).
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Creates a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attaches a source error for server-side logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Replaces the machine-readable error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Creates a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Creates a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Creates a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Creates a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Creates a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Creates a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Creates a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        let message = err.to_string();
        match err {
            AdmissionError::NotAuthorized => Self::forbidden(message).with_code("NOT_AUTHORIZED"),
            AdmissionError::SessionUnavailable => {
                Self::conflict(message).with_code("SESSION_UNAVAILABLE")
            }
            AdmissionError::NotEnrolled => Self::bad_request(message).with_code("NOT_ENROLLED"),
            AdmissionError::WrongBookingChannel { .. } => {
                Self::bad_request(message).with_code("WRONG_BOOKING_CHANNEL")
            }
            AdmissionError::FlexibleRestricted => {
                Self::bad_request(message).with_code("FLEXIBLE_RESTRICTED")
            }
            AdmissionError::NoAuthorization => {
                Self::bad_request(message).with_code("NO_AUTHORIZATION")
            }
            AdmissionError::AuthorizationExhausted => {
                Self::bad_request(message).with_code("AUTHORIZATION_EXHAUSTED")
            }
            AdmissionError::DuplicateBooking => {
                Self::conflict(message).with_code("DUPLICATE_BOOKING")
            }
        }
    }
}

impl From<CancellationError> for AppError {
    fn from(err: CancellationError) -> Self {
        let message = err.to_string();
        match err {
            CancellationError::LateCancellation => {
                Self::bad_request(message).with_code("LATE_CANCELLATION")
            }
            CancellationError::NotCancellable(_) => {
                Self::conflict(message).with_code("NOT_CANCELLABLE")
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Admission(inner) => inner.into(),
            StoreError::Cancellation(inner) => inner.into(),
            StoreError::SlotPlan(inner) => Self::validation(inner.to_string()),
            StoreError::NotFound(resource) => Self::not_found(resource),
            StoreError::InvalidInvitation => {
                Self::bad_request("invitation token is invalid or expired")
                    .with_code("INVALID_INVITATION")
            }
            err @ (StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::InvalidStatus(_)) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_code() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn exhausted_authorization_maps_to_400() {
        let err: AppError = AdmissionError::AuthorizationExhausted.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "AUTHORIZATION_EXHAUSTED");
    }

    #[test]
    fn duplicate_booking_maps_to_409() {
        let err: AppError = AdmissionError::DuplicateBooking.into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "DUPLICATE_BOOKING");
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound("session").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn late_cancellation_maps_to_400() {
        let err: AppError = CancellationError::LateCancellation.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "LATE_CANCELLATION");
    }
}
