//! Conversation lifecycle and inbox service.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, DomainError, SellPostId, Timestamp, UserId};
use crate::domain::marketplace::{
    Conversation, ConversationStatus, Message, ParticipantRole, SellerReview,
};
use crate::ports::{
    ConversationStore, InboxEntry, ListingReader, ListingSummary, MessageStore, ReviewStore,
};

/// Fully hydrated conversation for the detail view: the thread itself, the
/// listing it is about, the complete message history (ascending), and the
/// review if one exists.
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub viewer_role: ParticipantRole,
    pub listing: ListingSummary,
    pub messages: Vec<Message>,
    pub review: Option<SellerReview>,
}

/// Service over conversation lifecycle: get-or-create, hydration, inbox
/// listing, and the status transitions (complete / archive / block).
#[derive(Clone)]
pub struct ConversationService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    reviews: Arc<dyn ReviewStore>,
    listings: Arc<dyn ListingReader>,
}

impl ConversationService {
    /// Creates a new ConversationService.
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        reviews: Arc<dyn ReviewStore>,
        listings: Arc<dyn ListingReader>,
    ) -> Self {
        Self {
            conversations,
            messages,
            reviews,
            listings,
        }
    }

    /// A buyer's first (or repeated) contact on a listing.
    ///
    /// Resolves the seller from the listing, then performs the race-safe
    /// get-or-create keyed on (sell_post_id, buyer_id): two concurrent first
    /// contacts converge on the same conversation row.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the listing doesn't exist or is hidden to the buyer
    /// - `Permission` if the buyer is the listing's own seller
    pub async fn get_or_create(
        &self,
        sell_post_id: SellPostId,
        buyer: &UserId,
    ) -> Result<ConversationDetail, DomainError> {
        let listing = self
            .listings
            .find_summary(sell_post_id)
            .await?
            .filter(|l| l.status != crate::domain::marketplace::ListingStatus::Hidden)
            .ok_or_else(|| DomainError::not_found("Listing", sell_post_id))?;

        if &listing.seller.id == buyer {
            return Err(DomainError::permission(
                "cannot open a conversation on your own listing",
            ));
        }

        let conversation = self
            .conversations
            .get_or_create(sell_post_id, &listing.seller.id, buyer)
            .await?;

        tracing::debug!(
            conversation_id = %conversation.id,
            sell_post_id = %sell_post_id,
            buyer = %buyer,
            "conversation resolved"
        );

        self.hydrate(conversation, listing, ParticipantRole::Buyer).await
    }

    /// Full hydration for the conversation detail view. Participant-only.
    pub async fn get_with_messages(
        &self,
        id: ConversationId,
        caller: &UserId,
    ) -> Result<ConversationDetail, DomainError> {
        let conversation = self.require(id).await?;
        let viewer_role = conversation
            .role_of(caller)
            .ok_or_else(|| DomainError::permission("caller is not a participant"))?;

        let listing = self
            .listings
            .find_summary(conversation.sell_post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", conversation.sell_post_id))?;

        self.hydrate(conversation, listing, viewer_role).await
    }

    /// Every conversation where the user is buyer or seller, stamped with
    /// `is_seller` and `unread_count`, most recently updated first.
    pub async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<InboxEntry>, DomainError> {
        self.conversations.list_for_user(user, status).await
    }

    /// Marks the transaction complete. Either participant may trigger it;
    /// the transition is one-way.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `Permission` as usual
    /// - `AlreadyCompleted` on a duplicate request
    pub async fn complete_transaction(
        &self,
        id: ConversationId,
        caller: &UserId,
    ) -> Result<Conversation, DomainError> {
        let mut conversation = self.require(id).await?;
        if !conversation.is_participant(caller) {
            return Err(DomainError::permission("caller is not a participant"));
        }

        let now = Timestamp::now();
        conversation.complete(now)?;
        self.conversations.complete(id, now).await?;

        tracing::info!(conversation_id = %id, by = %caller, "transaction completed");
        Ok(conversation)
    }

    /// Archives the conversation for both participants.
    pub async fn archive(&self, id: ConversationId, caller: &UserId) -> Result<(), DomainError> {
        self.transition(id, caller, ConversationStatus::Archived).await
    }

    /// Blocks the conversation; subsequent sends are rejected.
    pub async fn block(&self, id: ConversationId, caller: &UserId) -> Result<(), DomainError> {
        self.transition(id, caller, ConversationStatus::Blocked).await
    }

    /// Unread-message total across the user's non-archived conversations,
    /// for the notification badge.
    pub async fn unread_badge_count(&self, user: &UserId) -> Result<u64, DomainError> {
        self.conversations.unread_badge_count(user).await
    }

    async fn transition(
        &self,
        id: ConversationId,
        caller: &UserId,
        status: ConversationStatus,
    ) -> Result<(), DomainError> {
        let conversation = self.require(id).await?;
        if !conversation.is_participant(caller) {
            return Err(DomainError::permission("caller is not a participant"));
        }
        self.conversations.set_status(id, status).await?;
        tracing::info!(conversation_id = %id, ?status, by = %caller, "conversation status changed");
        Ok(())
    }

    async fn require(&self, id: ConversationId) -> Result<Conversation, DomainError> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Conversation", id))
    }

    async fn hydrate(
        &self,
        conversation: Conversation,
        listing: ListingSummary,
        viewer_role: ParticipantRole,
    ) -> Result<ConversationDetail, DomainError> {
        let messages = self.messages.list_for_conversation(conversation.id).await?;
        let review = self.reviews.find_by_conversation(conversation.id).await?;
        Ok(ConversationDetail {
            conversation,
            viewer_role,
            listing,
            messages,
            review,
        })
    }
}
