//! Conversation view state machine.
//!
//! One instance backs one open conversation for one participant:
//!
//! ```text
//! Loading ──fetch ok──> Ready ──teardown──> (dropped)
//!    │                    │
//!    └──fetch err──> Failed (retry() returns to Loading)
//! ```
//!
//! Within Ready, `sending`, `completing`, and `submitting_review` are
//! independent transient flags guarding their in-flight mutations. The
//! message bubble is appended only after server acknowledgment - optimistic
//! appends would duplicate IDs against the realtime echo.

use std::sync::Arc;

use crate::adapters::http::conversation::dto::{ConversationDetailView, MessageView};
use crate::domain::foundation::{ConversationId, DomainError, Timestamp, UserId};
use crate::domain::marketplace::{ConversationStatus, ParticipantRole};

use super::channel::{ChannelEvent, RealtimeChannel};
use super::feed::FeedEvent;
use super::gateway::{ConversationGateway, ReviewSubmission};

/// The view's lifecycle state.
#[derive(Debug)]
pub enum ViewState {
    /// Initial fetch in flight.
    Loading,
    /// Fetch failed; the UI shows the message with a retry affordance.
    Failed(String),
    /// Conversation on screen.
    Ready(ReadyState),
}

/// In-memory state of an open conversation.
#[derive(Debug)]
pub struct ReadyState {
    pub detail: ConversationDetailView,
    /// Message submission in flight; the submit control is disabled.
    pub sending: bool,
    /// Mark-complete in flight.
    pub completing: bool,
    /// Review submission in flight.
    pub submitting_review: bool,
    /// The other participant is composing.
    pub remote_typing: bool,
    /// Our own compose box is non-empty (drives typing signals).
    compose_active: bool,
}

impl ReadyState {
    fn new(detail: ConversationDetailView) -> Self {
        Self {
            detail,
            sending: false,
            completing: false,
            submitting_review: false,
            remote_typing: false,
            compose_active: false,
        }
    }
}

/// Orchestrates one participant's open conversation.
pub struct ConversationView {
    gateway: Arc<dyn ConversationGateway>,
    channel: Arc<dyn RealtimeChannel>,
    conversation_id: ConversationId,
    user_id: UserId,
    state: ViewState,
}

impl ConversationView {
    /// Creates a view in Loading state. Call [`load`](Self::load) next.
    pub fn new(
        gateway: Arc<dyn ConversationGateway>,
        channel: Arc<dyn RealtimeChannel>,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Self {
        Self {
            gateway,
            channel,
            conversation_id,
            user_id,
            state: ViewState::Loading,
        }
    }

    /// Current state for rendering.
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Loads the conversation. Entering Ready triggers an immediate
    /// read-mark (channel first, HTTP fallback).
    pub async fn load(&mut self) {
        match self.gateway.fetch(self.conversation_id).await {
            Ok(detail) => {
                self.state = ViewState::Ready(ReadyState::new(detail));
                self.mark_read_best_effort().await;
            }
            Err(e) => {
                self.state = ViewState::Failed(e.to_string());
            }
        }
    }

    /// Retry after a load failure.
    pub async fn retry(&mut self) {
        self.state = ViewState::Loading;
        self.load().await;
    }

    /// Applies one feed event to local state.
    pub async fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Push(ChannelEvent::MessageCreated(message)) => {
                self.apply_pushed_message(message).await;
            }
            FeedEvent::Push(ChannelEvent::MessagesRead { reader_id, .. }) => {
                self.apply_read_receipt(&reader_id);
            }
            FeedEvent::Push(ChannelEvent::TypingStarted { user_id }) => {
                if user_id != self.user_id.as_str() {
                    if let ViewState::Ready(ready) = &mut self.state {
                        ready.remote_typing = true;
                    }
                }
            }
            FeedEvent::Push(ChannelEvent::TypingStopped { user_id }) => {
                if user_id != self.user_id.as_str() {
                    if let ViewState::Ready(ready) = &mut self.state {
                        ready.remote_typing = false;
                    }
                }
            }
            FeedEvent::Snapshot(snapshot) => {
                self.apply_snapshot(snapshot).await;
            }
        }
    }

    /// Sends a message over the durable path.
    ///
    /// Ignored while a previous send is in flight (the submit control is
    /// disabled in that state). The bubble appears only on acknowledgment.
    pub async fn send(&mut self, content: &str) -> Result<(), DomainError> {
        {
            let Some(ready) = self.ready_mut() else {
                return Ok(());
            };
            if ready.sending {
                return Ok(());
            }
            ready.sending = true;
        }

        let result = self.gateway.send_message(self.conversation_id, content).await;

        // Compose box empties on send; stop the typing indicator.
        let _ = self.channel.send_typing(false).await;

        let Some(ready) = self.ready_mut() else {
            return result.map(|_| ());
        };
        ready.sending = false;
        ready.compose_active = false;

        match result {
            Ok(message) => {
                if !ready.detail.messages.iter().any(|m| m.id == message.id) {
                    ready.detail.messages.push(message);
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Tracks the compose box; emits typing start on the empty→non-empty
    /// edge and stop on the reverse. Best effort, at most one signal per
    /// edge.
    pub async fn set_composing(&mut self, text: &str) {
        let active = !text.trim().is_empty();
        let edge = {
            let Some(ready) = self.ready_mut() else { return };
            if ready.compose_active == active {
                None
            } else {
                ready.compose_active = active;
                Some(active)
            }
        };

        if let Some(active) = edge {
            if let Err(e) = self.channel.send_typing(active).await {
                tracing::debug!("typing signal dropped: {}", e);
            }
        }
    }

    /// Marks the transaction complete.
    pub async fn mark_complete(&mut self) -> Result<(), DomainError> {
        {
            let Some(ready) = self.ready_mut() else {
                return Ok(());
            };
            if ready.completing {
                return Ok(());
            }
            ready.completing = true;
        }

        let result = self.gateway.complete(self.conversation_id).await;

        if let Some(ready) = self.ready_mut() {
            ready.completing = false;
            if result.is_ok() {
                ready.detail.conversation.transaction_completed = true;
                ready.detail.conversation.status = ConversationStatus::Completed;
                ready.detail.conversation.completed_at = Some(Timestamp::now().to_rfc3339());
            }
        }
        result
    }

    /// Whether the review form is reachable: transaction completed, caller
    /// is the buyer, and no review exists yet.
    pub fn can_submit_review(&self) -> bool {
        match &self.state {
            ViewState::Ready(ready) => {
                ready.detail.conversation.transaction_completed
                    && ready.detail.viewer_role == ParticipantRole::Buyer
                    && ready.detail.review.is_none()
            }
            _ => false,
        }
    }

    /// Submits the seller review.
    pub async fn submit_review(
        &mut self,
        submission: ReviewSubmission,
    ) -> Result<(), DomainError> {
        // Client-side gating mirrors the server's precondition errors.
        {
            let Some(ready) = self.ready_mut() else {
                return Ok(());
            };
            if ready.submitting_review {
                return Ok(());
            }
            if !ready.detail.conversation.transaction_completed {
                return Err(DomainError::TransactionIncomplete(
                    ready.detail.conversation.id.clone(),
                ));
            }
            if ready.detail.viewer_role != ParticipantRole::Buyer {
                return Err(DomainError::permission("only the buyer may review"));
            }
            if ready.detail.review.is_some() {
                return Err(DomainError::DuplicateReview(
                    ready.detail.conversation.id.clone(),
                ));
            }
            ready.submitting_review = true;
        }

        let result = self
            .gateway
            .submit_review(self.conversation_id, submission)
            .await;

        if let Some(ready) = self.ready_mut() {
            ready.submitting_review = false;
            if let Ok(ref review) = result {
                ready.detail.review = Some(review.clone());
            }
        }
        result.map(|_| ())
    }

    // ── internals ────────────────────────────────────────────────────────

    async fn apply_pushed_message(&mut self, message: MessageView) {
        let from_other = message.sender_id != self.user_id.as_str();
        let appended = {
            let Some(ready) = self.ready_mut() else { return };
            // The sender's own echo arrives too; dedupe by id against the
            // acknowledged append.
            if ready.detail.messages.iter().any(|m| m.id == message.id) {
                false
            } else {
                ready.detail.messages.push(message);
                true
            }
        };

        // The conversation is on screen, so an incoming message is read
        // the moment it lands.
        if appended && from_other {
            self.mark_read_best_effort().await;
        }
    }

    fn apply_read_receipt(&mut self, reader_id: &str) {
        if reader_id == self.user_id.as_str() {
            return; // our own receipt echo
        }
        let Some(ready) = self.ready_mut() else { return };
        let now = Timestamp::now().to_rfc3339();
        for message in ready
            .detail
            .messages
            .iter_mut()
            .filter(|m| m.read_at.is_none() && m.sender_id != reader_id)
        {
            message.read_at = Some(now.clone());
        }
    }

    async fn apply_snapshot(&mut self, snapshot: ConversationDetailView) {
        let accepted = {
            let Some(ready) = self.ready_mut() else { return };
            // Count-based reconciliation: only accept a snapshot that holds
            // strictly more messages, so a stale poll response can never
            // clobber a just-acknowledged send.
            if snapshot.messages.len() > ready.detail.messages.len() {
                ready.detail = snapshot;
                true
            } else {
                false
            }
        };

        if accepted {
            self.mark_read_best_effort().await;
        }
    }

    /// Read marking prefers the realtime channel and falls back to HTTP.
    /// Both paths are idempotent; failures are logged, never surfaced.
    async fn mark_read_best_effort(&mut self) {
        if self.channel.is_connected() {
            match self.channel.mark_read().await {
                Ok(()) => return,
                Err(e) => tracing::debug!("socket read-mark failed, falling back: {}", e),
            }
        }
        if let Err(e) = self.gateway.mark_read(self.conversation_id).await {
            tracing::debug!("read-mark failed: {}", e);
        }
    }

    fn ready_mut(&mut self) -> Option<&mut ReadyState> {
        match &mut self.state {
            ViewState::Ready(ready) => Some(ready),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test support
// ════════════════════════════════════════════════════════════════════════════════
