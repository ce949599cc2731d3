//! WebSocket adapter - realtime delivery for open conversations.
//!
//! Per-conversation rooms push three kinds of events to connected
//! participants: new-message notifications, read receipts, and transient
//! typing indicators. Message *sending* never travels this channel; the
//! durable HTTP path owns it.

mod handler;
mod messages;
mod notifier;
mod rooms;

pub use handler::{live_router, ws_handler, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, ConversationEvent, ConversationEventKind, ErrorMessage,
    EventEnvelope, PongMessage, ServerMessage,
};
pub use notifier::RoomNotifier;
pub use rooms::{ClientId, RoomManager};
