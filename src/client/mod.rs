//! Conversation view client - the orchestrator behind an open conversation.
//!
//! Composes the durable HTTP gateway and the realtime channel into one
//! experience: message history, acknowledged (never optimistic) send, read
//! marking, typing indicators, completion, and review submission.
//!
//! Delivery is a single abstract "message-arrived" event source
//! ([`feed::spawn_feed`]) with two backing strategies selected by the
//! channel's connection flag: push subscription while the socket is up,
//! interval polling (default 3 s) with count-based reconciliation when it
//! is not.
//!
//! ```text
//! RealtimeChannel ──┐                       ┌─> ConversationView::apply
//!                   ├─> spawn_feed ─> FeedEvent
//! ConversationGateway (poll) ──┘            └─> render
//! ```

pub mod channel;
pub mod feed;
pub mod gateway;
pub mod view;

pub use channel::{ChannelEvent, DisconnectedChannel, RealtimeChannel};
pub use feed::{spawn_feed, FeedEvent, FeedHandle};
pub use gateway::{ConversationGateway, HttpConversationGateway, ReviewSubmission};
pub use view::{ConversationView, ReadyState, ViewState};
