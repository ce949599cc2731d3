//! Realtime notification port.
//!
//! Durability never depends on delivery: services persist first through the
//! stores and then notify through this port. Implementations must swallow
//! and log their own failures - a dead socket is not an application error.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::marketplace::{Conversation, Message};

/// Best-effort push notifications to a conversation's connected participants.
#[async_trait]
pub trait ConversationNotifier: Send + Sync {
    /// A new message was persisted to the conversation.
    async fn message_created(&self, conversation: &Conversation, message: &Message);

    /// `reader` marked `count` incoming messages as read.
    async fn messages_read(&self, conversation_id: ConversationId, reader: &UserId, count: u64);
}

/// Notifier that drops every event; for tests and headless tooling.
pub struct NullNotifier;

#[async_trait]
impl ConversationNotifier for NullNotifier {
    async fn message_created(&self, _conversation: &Conversation, _message: &Message) {}

    async fn messages_read(&self, _conversation_id: ConversationId, _reader: &UserId, _count: u64) {
    }
}
