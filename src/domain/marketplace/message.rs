//! Message entity - an immutable entry in a conversation's append-only log.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ConversationId, MessageId, Timestamp, UserId, ValidationError,
};

/// A chat message.
///
/// Content is immutable after creation. `read_at` is the read receipt: set
/// once by the non-sending participant, never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
    pub read_at: Option<Timestamp>,
}

impl Message {
    /// Maximum message length, matching the compose box limit.
    pub const MAX_CONTENT_CHARS: usize = 4000;

    /// Creates a new unread message after validating the content.
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        Self::validate_content(&content)?;
        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            content,
            created_at: Timestamp::now(),
            read_at: None,
        })
    }

    /// Validates message content: non-blank and within the length limit.
    pub fn validate_content(content: &str) -> Result<(), ValidationError> {
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        if content.chars().count() > Self::MAX_CONTENT_CHARS {
            return Err(ValidationError::too_long("content", Self::MAX_CONTENT_CHARS));
        }
        Ok(())
    }

    /// Whether the message has been seen by the other participant.
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Whether this message counts as unread for `user`'s view, i.e. it was
    /// sent by the other participant and has no read receipt yet.
    pub fn is_unread_for(&self, user: &UserId) -> bool {
        &self.sender_id != user && self.read_at.is_none()
    }

    /// Records the read receipt. Monotonic: a second call is a no-op.
    ///
    /// Returns true if the receipt was set by this call.
    pub fn mark_read(&mut self, now: Timestamp) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(now);
        true
    }
}
