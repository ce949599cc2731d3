//! WebSocket message types for realtime conversation delivery.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, conversation events, errors, pings
//! - Client → Server: pings, read marking, typing state

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, Timestamp};

// ============================================
// Internal Types
// ============================================

/// Kinds of events broadcast inside a conversation room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEventKind {
    /// A new message was persisted.
    MessageCreated,
    /// Incoming messages were marked read.
    MessagesRead,
    /// The remote participant started composing.
    TypingStarted,
    /// The remote participant stopped composing.
    TypingStopped,
}

/// Internal representation of a conversation event for broadcasting.
///
/// This is what the notifier creates and sends to rooms.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub kind: ConversationEventKind,
    pub conversation_id: ConversationId,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl ConversationEvent {
    /// Creates an event occurring now.
    pub fn new(
        kind: ConversationEventKind,
        conversation_id: ConversationId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            conversation_id,
            payload,
            occurred_at: Timestamp::now(),
        }
    }

    /// Convert to a server message for sending to clients.
    pub fn to_server_message(self) -> ServerMessage {
        let envelope = EventEnvelope {
            conversation_id: self.conversation_id.to_string(),
            payload: self.payload,
            timestamp: self.occurred_at.to_rfc3339(),
        };
        match self.kind {
            ConversationEventKind::MessageCreated => ServerMessage::MessageCreated(envelope),
            ConversationEventKind::MessagesRead => ServerMessage::MessagesRead(envelope),
            ConversationEventKind::TypingStarted => ServerMessage::TypingStarted(envelope),
            ConversationEventKind::TypingStopped => ServerMessage::TypingStopped(envelope),
        }
    }
}

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and room joined.
    Connected(ConnectedMessage),

    /// A new message exists; fetch/append it.
    #[serde(rename = "message.created")]
    MessageCreated(EventEnvelope),

    /// Read receipt for previously sent messages.
    #[serde(rename = "messages.read")]
    MessagesRead(EventEnvelope),

    /// Remote participant started typing.
    #[serde(rename = "typing.started")]
    TypingStarted(EventEnvelope),

    /// Remote participant stopped typing.
    #[serde(rename = "typing.stopped")]
    TypingStopped(EventEnvelope),

    /// Error occurred.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

/// Sent when a client successfully connects and joins a conversation room.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub conversation_id: String,
    pub client_id: String,
    pub timestamp: String,
}

/// Event envelope: `{type, conversationId, payload}` plus a timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub conversation_id: String,
    pub payload: serde_json::Value,
    pub timestamp: String,
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,

    /// Mark incoming messages read (same idempotent operation as the HTTP
    /// read endpoint).
    MarkRead,

    /// Compose box became non-empty.
    #[serde(rename = "typing.start")]
    TypingStart,

    /// Compose box cleared or message sent.
    #[serde(rename = "typing.stop")]
    TypingStop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_serializes_with_type_tag() {
        let msg = ServerMessage::Connected(ConnectedMessage {
            conversation_id: "conv-123".to_string(),
            client_id: "client-456".to_string(),
            timestamp: "2025-01-10T00:00:00Z".to_string(),
        });

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"connected""#));
        assert!(json.contains(r#""conversationId":"conv-123""#));
    }

    #[test]
    fn message_created_event_serializes_with_dotted_type() {
        let event = ConversationEvent::new(
            ConversationEventKind::MessageCreated,
            ConversationId::new(),
            serde_json::json!({"id": "msg-1"}),
        );

        let json = serde_json::to_string(&event.to_server_message()).unwrap();
        assert!(json.contains(r#""type":"message.created""#));
        assert!(json.contains(r#""payload":{"id":"msg-1"}"#));
    }

    #[test]
    fn read_receipt_event_converts_to_server_message() {
        let event = ConversationEvent::new(
            ConversationEventKind::MessagesRead,
            ConversationId::new(),
            serde_json::json!({"count": 2}),
        );
        assert!(matches!(
            event.to_server_message(),
            ServerMessage::MessagesRead(_)
        ));
    }

    #[test]
    fn client_message_deserializes_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn client_message_deserializes_mark_read() {
        let json = r#"{"type": "mark_read"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::MarkRead));
    }

    #[test]
    fn client_message_deserializes_typing_variants() {
        let start: ClientMessage = serde_json::from_str(r#"{"type": "typing.start"}"#).unwrap();
        let stop: ClientMessage = serde_json::from_str(r#"{"type": "typing.stop"}"#).unwrap();
        assert!(matches!(start, ClientMessage::TypingStart));
        assert!(matches!(stop, ClientMessage::TypingStop));
    }

    #[test]
    fn error_message_serializes_correctly() {
        let msg = ServerMessage::Error(ErrorMessage {
            code: "PERMISSION_DENIED".to_string(),
            message: "Not a participant".to_string(),
            timestamp: "2025-01-10T00:00:00Z".to_string(),
        });

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""code":"PERMISSION_DENIED""#));
    }
}
