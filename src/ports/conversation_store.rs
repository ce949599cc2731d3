//! Conversation store port.
//!
//! # Design
//!
//! - **One conversation per (listing, buyer)**: the unique key is owned by
//!   the storage layer; `get_or_create` must resolve creation races through
//!   it (conflict then re-read), never through application-level locking.
//! - **Single-row atomicity**: every mutation touches one conversation row.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, SellPostId, Timestamp, UserId};
use crate::domain::marketplace::{Conversation, ConversationStatus, Message};

/// One row of a user's inbox: the conversation plus the display aggregates
/// the inbox needs (unread count, last message preview, listing title).
#[derive(Debug, Clone)]
pub struct InboxEntry {
    pub conversation: Conversation,
    /// Whether the queried user is the seller side of this conversation.
    pub is_seller: bool,
    /// Messages from the other participant with no read receipt.
    pub unread_count: u64,
    pub listing_title: String,
    pub listing_image: Option<String>,
    pub last_message: Option<Message>,
}

/// Store port for conversation rows.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Looks up the unique (sell_post_id, buyer_id) conversation, creating it
    /// if absent. Concurrent first contacts must converge on one row.
    async fn get_or_create(
        &self,
        sell_post_id: SellPostId,
        seller_id: &UserId,
        buyer_id: &UserId,
    ) -> Result<Conversation, DomainError>;

    /// Finds a conversation by id.
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, DomainError>;

    /// Every conversation where the user is buyer or seller, most recently
    /// updated first, optionally filtered by status.
    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<InboxEntry>, DomainError>;

    /// Sets the conversation status.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation doesn't exist
    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), DomainError>;

    /// Persists the completion fields: transaction_completed = true,
    /// completed_at, status = COMPLETED.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation doesn't exist
    async fn complete(
        &self,
        id: ConversationId,
        completed_at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Unread-message total across the user's non-archived conversations
    /// (the notification badge).
    async fn unread_badge_count(&self, user: &UserId) -> Result<u64, DomainError>;

    /// Number of completed transactions where the user was the seller.
    async fn completed_count_for_seller(&self, seller: &UserId) -> Result<u64, DomainError>;
}
