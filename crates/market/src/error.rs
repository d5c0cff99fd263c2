//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Rejected requests answer
//! with a JSON body `{"error": key, "message": text}` where `key` is the
//! stable notice key. Server-side failures are captured to Sentry and never
//! expose their details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::MarketError;

/// Application-level error type for the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// A marketplace operation was rejected or failed.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Reading or writing the HTTP session failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Malformed request outside the engine's own validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    const fn is_internal(&self) -> bool {
        match self {
            Self::Market(err) => err.is_internal(),
            Self::Session(_) | Self::Internal(_) => true,
            Self::BadRequest(_) => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Market(err) => match err {
                MarketError::Validation(_) => StatusCode::BAD_REQUEST,
                MarketError::NotFound(_) => StatusCode::NOT_FOUND,
                MarketError::NotAuthenticated | MarketError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                MarketError::AccountBlocked | MarketError::Forbidden => StatusCode::FORBIDDEN,
                MarketError::OutOfStock { .. }
                | MarketError::InsufficientStock { .. }
                | MarketError::DuplicateAccount
                | MarketError::EmptyCartOrNoSession
                | MarketError::InsufficientWalletBalance { .. }
                | MarketError::WalletUnavailable
                | MarketError::MixedSellerCart
                | MarketError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
                MarketError::PasswordHash | MarketError::Persistence(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_internal() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Market(err) if !err.is_internal() => ErrorBody {
                error: err.key(),
                message: err.notice().message(),
            },
            Self::BadRequest(reason) => ErrorBody {
                error: "form.invalid",
                message: reason.clone(),
            },
            _ => ErrorBody {
                error: "system.error",
                message: "Internal server error".to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
