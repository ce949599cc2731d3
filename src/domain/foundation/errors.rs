//! Error types for the domain layer.
//!
//! `DomainError` is the single error vocabulary of the marketplace: every
//! service operation rejects with one of its variants so callers can render
//! a precise message. `ValidationError` covers value-object construction.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    TooLong { field: String, max: usize },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i32, max: i32, actual: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates a too-long validation error.
    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
        }
    }
}

/// Domain error taxonomy for the marketplace conversation layer.
///
/// Each variant maps to one user-visible failure mode; the stable string
/// code is what goes over the wire.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Referenced conversation/message/review/listing does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller is not a participant/owner/author for the requested operation.
    #[error("Permission denied: {reason}")]
    Permission { reason: String },

    /// Message send attempted on a blocked conversation.
    #[error("Conversation {0} is blocked and cannot accept messages")]
    ConversationBlocked(String),

    /// Duplicate complete-transaction request.
    #[error("Transaction for conversation {0} is already completed")]
    AlreadyCompleted(String),

    /// Review attempted before the transaction was completed.
    #[error("Transaction for conversation {0} is not completed yet")]
    TransactionIncomplete(String),

    /// Review's seller disagrees with the conversation's seller.
    #[error("Seller mismatch: expected {expected}, got {got}")]
    SellerMismatch { expected: String, got: String },

    /// A review already exists for the conversation.
    #[error("A review already exists for conversation {0}")]
    DuplicateReview(String),

    /// Rating outside the 1-5 range.
    #[error("Rating must be between 1 and 5, got {value}")]
    InvalidRating { value: i32 },

    /// Malformed input rejected at the boundary.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Realtime channel or HTTP call failed at the network level.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Persistence layer failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Creates a not-found error for an entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a permission error.
    pub fn permission(reason: impl Into<String>) -> Self {
        DomainError::Permission {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::Permission { .. } => "PERMISSION_DENIED",
            DomainError::ConversationBlocked(_) => "CONVERSATION_BLOCKED",
            DomainError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            DomainError::TransactionIncomplete(_) => "TRANSACTION_INCOMPLETE",
            DomainError::SellerMismatch { .. } => "SELLER_MISMATCH",
            DomainError::DuplicateReview(_) => "DUPLICATE_REVIEW",
            DomainError::InvalidRating { .. } => "INVALID_RATING",
            DomainError::Validation(_) => "VALIDATION_FAILED",
            DomainError::Transport(_) => "TRANSPORT_ERROR",
            DomainError::Database(_) => "DATABASE_ERROR",
        }
    }
}
