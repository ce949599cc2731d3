//! API error type that converts domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// Wire shape of an error response.
///
/// Both sides of the wire use it: handlers serialize it, the client gateway
/// reads it back to pick the domain error to surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// HTTP-facing error: a status plus the machine-readable body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// 400 with a VALIDATION_FAILED-style code.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 429 for rate-limited requests.
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            format!(
                "Too many requests. Retry after {} seconds.",
                retry_after_secs
            ),
        )
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Permission { .. } => StatusCode::FORBIDDEN,
            DomainError::ConversationBlocked(_)
            | DomainError::AlreadyCompleted(_)
            | DomainError::TransactionIncomplete(_)
            | DomainError::DuplicateReview(_) => StatusCode::CONFLICT,
            DomainError::SellerMismatch { .. } | DomainError::InvalidRating { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Transport(_) => StatusCode::BAD_GATEWAY,
            DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", err);
            // Don't leak storage details to the client.
            return Self::new(status, err.code(), "An internal error occurred");
        }

        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}
