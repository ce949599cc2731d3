//! Realtime channel port for the conversation view.
//!
//! One channel is scoped to one conversation. The trait mirrors what the
//! server's live endpoint offers: a connection-state flag, an event stream,
//! and the two client-side emissions (read marking and typing). A concrete
//! socket transport is supplied by the embedding UI; [`DisconnectedChannel`]
//! serves polling-only deployments and tests.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::adapters::http::conversation::dto::MessageView;
use crate::domain::foundation::DomainError;

/// Events a channel delivers to the view.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The other participant's (or our own echoed) new message.
    MessageCreated(MessageView),
    /// Read receipt: `reader_id` saw `count` messages.
    MessagesRead { reader_id: String, count: u64 },
    /// Remote compose started.
    TypingStarted { user_id: String },
    /// Remote compose stopped.
    TypingStopped { user_id: String },
}

/// Per-conversation realtime channel.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Whether the socket is currently connected. The feed checks this flag
    /// to choose between push delivery and polling.
    fn is_connected(&self) -> bool;

    /// Subscribes to the channel's event stream.
    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent>;

    /// Emits a read-mark over the socket.
    ///
    /// # Errors
    ///
    /// - `Transport` when the socket is down; callers fall back to HTTP
    async fn mark_read(&self) -> Result<(), DomainError>;

    /// Emits a typing start/stop signal. Fire-and-forget semantics; no
    /// delivery guarantee is required.
    async fn send_typing(&self, active: bool) -> Result<(), DomainError>;
}

/// A channel that is never connected: polling-only operation.
pub struct DisconnectedChannel {
    // Kept alive so subscribers wait instead of seeing a closed stream.
    events: broadcast::Sender<ChannelEvent>,
}

impl DisconnectedChannel {
    /// Creates a never-connected channel.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for DisconnectedChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeChannel for DisconnectedChannel {
    fn is_connected(&self) -> bool {
        false
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    async fn mark_read(&self) -> Result<(), DomainError> {
        Err(DomainError::Transport("realtime channel not connected".into()))
    }

    async fn send_typing(&self, _active: bool) -> Result<(), DomainError> {
        Err(DomainError::Transport("realtime channel not connected".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disconnected_channel_reports_not_connected() {
        let channel = DisconnectedChannel::new();
        assert!(!channel.is_connected());
    }

    #[tokio::test]
    async fn disconnected_channel_mark_read_is_transport_error() {
        let channel = DisconnectedChannel::new();
        let result = channel.mark_read().await;
        assert!(matches!(result, Err(DomainError::Transport(_))));
    }

    #[tokio::test]
    async fn disconnected_channel_subscription_stays_open() {
        let channel = DisconnectedChannel::new();
        let mut rx = channel.subscribe();

        // No event should arrive; the stream must be pending, not closed.
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(10), rx.recv()).await;
        assert!(pending.is_err(), "expected timeout on a silent channel");
    }
}
