//! Single message-arrived event source with two backing strategies.
//!
//! While the realtime channel is connected, events are pushed straight
//! through. When it is not, the feed degrades to polling the conversation
//! snapshot at a fixed interval; the view reconciles snapshots by message
//! count. The strategy is re-selected on every iteration from the channel's
//! connection flag, so a dropped socket silently falls back and a recovered
//! one silently resumes push delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::adapters::http::conversation::dto::ConversationDetailView;
use crate::domain::foundation::ConversationId;

use super::channel::{ChannelEvent, RealtimeChannel};
use super::gateway::ConversationGateway;

/// What the feed emits to the view.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A realtime event pushed over the socket.
    Push(ChannelEvent),
    /// A polled full snapshot; reconcile by count before applying.
    Snapshot(ConversationDetailView),
}

/// Owns the feed task; aborting on drop is the teardown guarantee - no
/// orphaned polling timers survive a closed view.
pub struct FeedHandle {
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Stops the feed.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the feed for one conversation.
///
/// Returns the event receiver and the handle owning the background task.
pub fn spawn_feed(
    gateway: Arc<dyn ConversationGateway>,
    channel: Arc<dyn RealtimeChannel>,
    conversation_id: ConversationId,
    poll_interval: Duration,
    heartbeat: Duration,
) -> (mpsc::Receiver<FeedEvent>, FeedHandle) {
    let (tx, rx) = mpsc::channel(32);

    let task = tokio::spawn(async move {
        run_feed(gateway, channel, conversation_id, poll_interval, heartbeat, tx).await;
    });

    (rx, FeedHandle { task })
}

async fn run_feed(
    gateway: Arc<dyn ConversationGateway>,
    channel: Arc<dyn RealtimeChannel>,
    conversation_id: ConversationId,
    poll_interval: Duration,
    heartbeat: Duration,
    tx: mpsc::Sender<FeedEvent>,
) {
    let mut events = channel.subscribe();

    loop {
        if channel.is_connected() {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if tx.send(FeedEvent::Push(event)).await.is_err() {
                            return; // view closed
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "channel events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // Transport went away; resubscribe and let the
                        // connection flag route us to polling.
                        sleep(heartbeat).await;
                        events = channel.subscribe();
                    }
                },
                // Periodically re-check the connection flag even when the
                // socket is quiet.
                _ = sleep(heartbeat) => {}
            }
        } else {
            sleep(poll_interval).await;
            if channel.is_connected() {
                continue; // reconnected while sleeping; resume push
            }
            match gateway.fetch(conversation_id).await {
                Ok(snapshot) => {
                    if tx.send(FeedEvent::Snapshot(snapshot)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    // Poll failures degrade silently; the next tick retries.
                    tracing::debug!("conversation poll failed: {}", e);
                }
            }
        }
    }
}
