//! Message service - the append-only chat log and its read receipts.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::marketplace::{Conversation, Message};
use crate::ports::{ConversationNotifier, ConversationStore, MessageStore};

/// Service over message creation, read marking, unread aggregates, and
/// sender-side deletion.
///
/// Durability before delivery: every mutation goes through the store first;
/// the notifier only tells connected peers that something already happened.
#[derive(Clone)]
pub struct MessageService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    notifier: Arc<dyn ConversationNotifier>,
}

impl MessageService {
    /// Creates a new MessageService.
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        notifier: Arc<dyn ConversationNotifier>,
    ) -> Self {
        Self {
            conversations,
            messages,
            notifier,
        }
    }

    /// Appends a message to a conversation.
    ///
    /// Checks run in order: conversation exists, sender is a participant,
    /// conversation is not blocked, content is valid. The parent
    /// conversation's `updated_at` bump rides along in the store append.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `Permission`, `ConversationBlocked`, `Validation`
    pub async fn create(
        &self,
        conversation_id: ConversationId,
        sender: &UserId,
        content: &str,
    ) -> Result<Message, DomainError> {
        let conversation = self.require(conversation_id).await?;

        if !conversation.is_participant(sender) {
            return Err(DomainError::permission("sender is not a participant"));
        }
        if !conversation.accepts_messages() {
            return Err(DomainError::ConversationBlocked(conversation_id.to_string()));
        }

        let message = Message::new(conversation_id, sender.clone(), content)?;
        self.messages.append(&message).await?;

        tracing::debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            sender = %sender,
            "message appended"
        );

        self.notifier.message_created(&conversation, &message).await;
        Ok(message)
    }

    /// Bulk read-mark: stamps every unread incoming message for `reader`.
    ///
    /// Idempotent - marking twice has no additional effect - and a safe
    /// no-op (returns 0) when nothing is unread. Broadcasts a read receipt
    /// only when rows actually changed.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `Permission` for missing conversations or strangers
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<u64, DomainError> {
        let conversation = self.require(conversation_id).await?;
        if !conversation.is_participant(reader) {
            return Err(DomainError::permission("reader is not a participant"));
        }

        let count = self
            .messages
            .mark_read(conversation_id, reader, Timestamp::now())
            .await?;

        if count > 0 {
            self.notifier.messages_read(conversation_id, reader, count).await;
        }
        Ok(count)
    }

    /// Count of messages in the conversation unread by `user`.
    pub async fn unread_count(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let conversation = self.require(conversation_id).await?;
        if !conversation.is_participant(user) {
            return Err(DomainError::permission("caller is not a participant"));
        }
        self.messages.unread_count(conversation_id, user).await
    }

    /// Unread total across every conversation the user participates in.
    pub async fn total_unread_count(&self, user: &UserId) -> Result<u64, DomainError> {
        self.messages.total_unread(user).await
    }

    /// Recent-message digest: the last `limit` messages in ascending order.
    pub async fn recent(
        &self,
        conversation_id: ConversationId,
        caller: &UserId,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        let conversation = self.require(conversation_id).await?;
        if !conversation.is_participant(caller) {
            return Err(DomainError::permission("caller is not a participant"));
        }
        self.messages.recent(conversation_id, limit).await
    }

    /// Hard-deletes a message. Only the original sender may delete.
    pub async fn delete(&self, id: MessageId, caller: &UserId) -> Result<(), DomainError> {
        let message = self
            .messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message", id))?;

        if &message.sender_id != caller {
            return Err(DomainError::permission("only the sender may delete a message"));
        }
        self.messages.delete(id).await
    }

    async fn require(&self, id: ConversationId) -> Result<Conversation, DomainError> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Conversation", id))
    }
}
