//! ConversationNotifier implementation over the room manager.
//!
//! Services persist first, then call this; it turns store-side facts into
//! room broadcasts. Broadcasting to an empty or lagging room is fine - the
//! polling fallback and the next fetch are the recovery path.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::marketplace::{Conversation, Message};
use crate::ports::ConversationNotifier;

use super::messages::{ConversationEvent, ConversationEventKind};
use super::rooms::RoomManager;

/// Bridges repository side effects into WebSocket rooms.
pub struct RoomNotifier {
    room_manager: Arc<RoomManager>,
}

impl RoomNotifier {
    /// Create a new notifier over the given room manager.
    pub fn new(room_manager: Arc<RoomManager>) -> Self {
        Self { room_manager }
    }
}

#[async_trait]
impl ConversationNotifier for RoomNotifier {
    async fn message_created(&self, conversation: &Conversation, message: &Message) {
        let payload = serde_json::json!({
            "id": message.id.to_string(),
            "conversationId": message.conversation_id.to_string(),
            "senderId": message.sender_id.to_string(),
            "content": message.content,
            "createdAt": message.created_at.to_rfc3339(),
            "readAt": message.read_at.map(|t| t.to_rfc3339()),
        });

        self.room_manager
            .broadcast(
                &conversation.id,
                ConversationEvent::new(
                    ConversationEventKind::MessageCreated,
                    conversation.id,
                    payload,
                ),
            )
            .await;
    }

    async fn messages_read(&self, conversation_id: ConversationId, reader: &UserId, count: u64) {
        let payload = serde_json::json!({
            "readerId": reader.to_string(),
            "count": count,
        });

        self.room_manager
            .broadcast(
                &conversation_id,
                ConversationEvent::new(
                    ConversationEventKind::MessagesRead,
                    conversation_id,
                    payload,
                ),
            )
            .await;
    }
}
