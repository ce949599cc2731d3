//! PostgreSQL implementations of the marketplace persistence ports.

mod conversation_store;
mod listing_reader;
mod message_store;
mod review_store;

pub use conversation_store::PostgresConversationStore;
pub use listing_reader::PostgresListingReader;
pub use message_store::PostgresMessageStore;
pub use review_store::PostgresReviewStore;

use crate::domain::foundation::{DomainError, UserId};

/// SQLSTATE class for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE class for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Returns true if the error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}

/// Wraps a sqlx error as a domain database error.
pub(crate) fn db_err(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::Database(format!("{}: {}", context, err))
}

/// Reconstructs a UserId from a stored column.
///
/// Stored ids are never empty; an empty one means corrupt data, not bad input.
pub(crate) fn stored_user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| DomainError::Database(format!("corrupt stored user id: {}", e)))
}
