//! Conversation entity - one chat thread per (listing, buyer) pair.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, DomainError, SellPostId, Timestamp, UserId};

/// Lifecycle status of a conversation.
///
/// ACTIVE is the only state new conversations start in. BLOCKED is terminal
/// for messaging (sends rejected) but not for status changes; COMPLETED is
/// terminal for the completion action only - messaging may continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    Active,
    Archived,
    Blocked,
    Completed,
}

/// A participant's role relative to the conversation's listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Buyer,
    Seller,
}

/// A chat thread scoped to exactly one (SellPost, buyer) pair.
///
/// The seller is derived from the listing at creation time and both
/// participants are fixed for the conversation's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub sell_post_id: SellPostId,
    pub seller_id: UserId,
    pub buyer_id: UserId,
    pub status: ConversationStatus,
    pub transaction_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Starts a new active conversation for a buyer's first contact.
    pub fn start(sell_post_id: SellPostId, seller_id: UserId, buyer_id: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            sell_post_id,
            seller_id,
            buyer_id,
            status: ConversationStatus::Active,
            transaction_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the user is one of the two fixed participants.
    pub fn is_participant(&self, user: &UserId) -> bool {
        &self.seller_id == user || &self.buyer_id == user
    }

    /// Returns the user's role, or None for non-participants.
    pub fn role_of(&self, user: &UserId) -> Option<ParticipantRole> {
        if &self.seller_id == user {
            Some(ParticipantRole::Seller)
        } else if &self.buyer_id == user {
            Some(ParticipantRole::Buyer)
        } else {
            None
        }
    }

    /// Returns the other participant, or None for non-participants.
    pub fn other_participant(&self, user: &UserId) -> Option<&UserId> {
        match self.role_of(user)? {
            ParticipantRole::Seller => Some(&self.buyer_id),
            ParticipantRole::Buyer => Some(&self.seller_id),
        }
    }

    /// Whether new messages are accepted. Only BLOCKED rejects sends.
    pub fn accepts_messages(&self) -> bool {
        self.status != ConversationStatus::Blocked
    }

    /// Marks the transaction complete.
    ///
    /// One-way: a second call fails with `AlreadyCompleted`.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.transaction_completed {
            return Err(DomainError::AlreadyCompleted(self.id.to_string()));
        }
        self.transaction_completed = true;
        self.completed_at = Some(now);
        self.status = ConversationStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Bumps `updated_at` - the inbox ordering signal - on a new message.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller() -> UserId {
        UserId::new("seller-1").unwrap()
    }

    fn buyer() -> UserId {
        UserId::new("buyer-1").unwrap()
    }

    fn conversation() -> Conversation {
        Conversation::start(SellPostId::new(), seller(), buyer())
    }

    #[test]
    fn start_creates_active_conversation() {
        let conv = conversation();
        assert_eq!(conv.status, ConversationStatus::Active);
        assert!(!conv.transaction_completed);
        assert!(conv.completed_at.is_none());
    }

    #[test]
    fn both_participants_are_recognized() {
        let conv = conversation();
        assert!(conv.is_participant(&seller()));
        assert!(conv.is_participant(&buyer()));
        assert!(!conv.is_participant(&UserId::new("stranger").unwrap()));
    }

    #[test]
    fn role_of_distinguishes_buyer_and_seller() {
        let conv = conversation();
        assert_eq!(conv.role_of(&seller()), Some(ParticipantRole::Seller));
        assert_eq!(conv.role_of(&buyer()), Some(ParticipantRole::Buyer));
        assert_eq!(conv.role_of(&UserId::new("stranger").unwrap()), None);
    }

    #[test]
    fn other_participant_crosses_the_pair() {
        let conv = conversation();
        assert_eq!(conv.other_participant(&seller()), Some(&buyer()));
        assert_eq!(conv.other_participant(&buyer()), Some(&seller()));
        assert_eq!(conv.other_participant(&UserId::new("stranger").unwrap()), None);
    }

    #[test]
    fn blocked_conversation_rejects_messages() {
        let mut conv = conversation();
        assert!(conv.accepts_messages());
        conv.status = ConversationStatus::Blocked;
        assert!(!conv.accepts_messages());
    }

    #[test]
    fn completed_conversation_still_accepts_messages() {
        let mut conv = conversation();
        conv.complete(Timestamp::now()).unwrap();
        assert!(conv.accepts_messages());
    }

    #[test]
    fn complete_sets_all_completion_fields() {
        let mut conv = conversation();
        let now = Timestamp::now();
        conv.complete(now).unwrap();

        assert!(conv.transaction_completed);
        assert_eq!(conv.completed_at, Some(now));
        assert_eq!(conv.status, ConversationStatus::Completed);
    }

    #[test]
    fn complete_twice_fails_with_already_completed() {
        let mut conv = conversation();
        conv.complete(Timestamp::now()).unwrap();

        match conv.complete(Timestamp::now()) {
            Err(DomainError::AlreadyCompleted(_)) => {}
            other => panic!("Expected AlreadyCompleted, got {:?}", other),
        }
    }

    #[test]
    fn touch_bumps_updated_at() {
        let mut conv = conversation();
        let later = conv.updated_at.plus_secs(60);
        conv.touch(later);
        assert_eq!(conv.updated_at, later);
    }
}
