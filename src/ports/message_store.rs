//! Message store port - the append-only chat log.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::marketplace::Message;

/// Store port for message rows.
///
/// Messages are immutable once written; the only permitted updates are the
/// monotonic read receipt and hard deletion by the sender.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a message and bumps the parent conversation's `updated_at`
    /// (the inbox ordering signal). The bump is a best-effort secondary
    /// write: implementations may fold it into one transaction but its
    /// failure must not lose the message.
    async fn append(&self, message: &Message) -> Result<(), DomainError>;

    /// Finds a message by id.
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, DomainError>;

    /// All messages of a conversation, creation order ascending.
    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, DomainError>;

    /// The most recent `limit` messages, still in ascending order.
    async fn recent(
        &self,
        conversation_id: ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError>;

    /// Sets `read_at` for every unread message in the conversation that was
    /// sent by the *other* participant. Idempotent; returns rows affected.
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        at: Timestamp,
    ) -> Result<u64, DomainError>;

    /// Count of messages in the conversation unread by `user`.
    async fn unread_count(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError>;

    /// Unread total across all of the user's conversations.
    async fn total_unread(&self, user: &UserId) -> Result<u64, DomainError>;

    /// Hard-deletes a message.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the message doesn't exist
    async fn delete(&self, id: MessageId) -> Result<(), DomainError>;
}
