//! Per-conversation broadcast rooms.
//!
//! Every open socket for a conversation subscribes to that conversation's
//! room; service-side notifications fan out to the room only, so a buyer's
//! phone and laptop both hear about the seller's message while unrelated
//! conversations stay quiet. Rooms are created on first join and torn down
//! when the last subscriber leaves.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::ConversationId;

use super::messages::ConversationEvent;

/// Server-side identity of one WebSocket connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Assigns a fresh connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of conversation rooms.
///
/// Broadcasts (reads) vastly outnumber joins and leaves (writes), hence the
/// RwLock'd maps. Each room is one tokio broadcast channel; a full buffer
/// drops the oldest events and slow clients recover via their next fetch.
pub struct RoomManager {
    rooms: RwLock<HashMap<ConversationId, broadcast::Sender<ConversationEvent>>>,
    /// client_id → conversation_id, so disconnect cleanup is a single lookup.
    client_rooms: RwLock<HashMap<ClientId, ConversationId>>,
    channel_capacity: usize,
}

impl RoomManager {
    /// Creates a manager whose rooms buffer `channel_capacity` events each.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_rooms: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    /// Default capacity of 128 buffered events per room.
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Subscribes a client to a conversation's room, creating the room on
    /// first join.
    pub async fn join(
        &self,
        conversation_id: &ConversationId,
        client_id: ClientId,
    ) -> broadcast::Receiver<ConversationEvent> {
        let receiver = {
            let mut rooms = self.rooms.write().await;
            rooms
                .entry(*conversation_id)
                .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
                .subscribe()
        };

        self.client_rooms
            .write()
            .await
            .insert(client_id, *conversation_id);

        receiver
    }

    /// Detaches a client; the room itself is removed once nobody is left
    /// listening.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(conversation_id) = self.client_rooms.write().await.remove(client_id) else {
            return;
        };

        let mut rooms = self.rooms.write().await;
        let empty = rooms
            .get(&conversation_id)
            .is_some_and(|sender| sender.receiver_count() == 0);
        if empty {
            rooms.remove(&conversation_id);
        }
    }

    /// Fans an event out to every subscriber of the conversation's room.
    /// No room, no subscribers, or a full buffer are all non-events.
    pub async fn broadcast(&self, conversation_id: &ConversationId, event: ConversationEvent) {
        if let Some(sender) = self.rooms.read().await.get(conversation_id) {
            let _ = sender.send(event);
        }
    }

    /// Live subscriber count for one conversation's room.
    pub async fn client_count(&self, conversation_id: &ConversationId) -> usize {
        self.rooms
            .read()
            .await
            .get(conversation_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::messages::ConversationEventKind;

    fn test_event(conversation_id: ConversationId) -> ConversationEvent {
        ConversationEvent::new(
            ConversationEventKind::MessageCreated,
            conversation_id,
            serde_json::json!({"test": "data"}),
        )
    }

    #[tokio::test]
    async fn join_delivers_subsequent_broadcasts() {
        let manager = RoomManager::with_default_capacity();
        let conversation_id = ConversationId::new();

        let mut rx = manager.join(&conversation_id, ClientId::new()).await;
        manager.broadcast(&conversation_id, test_event(conversation_id)).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, ConversationEventKind::MessageCreated);
    }

    #[tokio::test]
    async fn every_subscriber_in_a_room_hears_the_event() {
        let manager = RoomManager::with_default_capacity();
        let conversation_id = ConversationId::new();

        let mut rx1 = manager.join(&conversation_id, ClientId::new()).await;
        let mut rx2 = manager.join(&conversation_id, ClientId::new()).await;

        manager.broadcast(&conversation_id, test_event(conversation_id)).await;

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn rooms_are_isolated_from_each_other() {
        let manager = RoomManager::with_default_capacity();
        let conv_1 = ConversationId::new();
        let conv_2 = ConversationId::new();

        let mut rx1 = manager.join(&conv_1, ClientId::new()).await;
        let _rx2 = manager.join(&conv_2, ClientId::new()).await;

        manager.broadcast(&conv_1, test_event(conv_1)).await;

        assert!(rx1.recv().await.is_ok());
        assert_eq!(manager.client_count(&conv_1).await, 1);
        assert_eq!(manager.client_count(&conv_2).await, 1);
    }

    #[tokio::test]
    async fn client_count_tracks_joins() {
        let manager = RoomManager::with_default_capacity();
        let conversation_id = ConversationId::new();

        assert_eq!(manager.client_count(&conversation_id).await, 0);

        let _rx1 = manager.join(&conversation_id, ClientId::new()).await;
        let _rx2 = manager.join(&conversation_id, ClientId::new()).await;
        assert_eq!(manager.client_count(&conversation_id).await, 2);
    }

    #[tokio::test]
    async fn last_leave_tears_the_room_down() {
        let manager = RoomManager::with_default_capacity();
        let conversation_id = ConversationId::new();
        let client_id = ClientId::new();

        {
            // Receiver dropped: the disconnect happened before leave().
            let _rx = manager.join(&conversation_id, client_id.clone()).await;
        }
        manager.leave(&client_id).await;

        // A broadcast to the departed room is a no-op, and a fresh join
        // starts from a clean channel.
        manager.broadcast(&conversation_id, test_event(conversation_id)).await;
        let mut rx = manager.join(&conversation_id, ClientId::new()).await;
        manager.broadcast(&conversation_id, test_event(conversation_id)).await;
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn leave_for_unknown_client_is_a_noop() {
        let manager = RoomManager::with_default_capacity();
        manager.leave(&ClientId::new()).await;
    }

    #[tokio::test]
    async fn broadcast_to_nonexistent_room_is_noop() {
        let manager = RoomManager::with_default_capacity();
        let conversation_id = ConversationId::new();
        manager.broadcast(&conversation_id, test_event(conversation_id)).await;
    }
}
