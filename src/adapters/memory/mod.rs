//! In-memory marketplace store for testing and single-process development.
//!
//! One struct implements all four persistence ports over a single RwLock'd
//! state, which is what makes the cross-entity aggregates (inbox entries,
//! unread totals) possible without a query planner. Not suitable for
//! production deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    ConversationId, DomainError, MessageId, ReviewId, SellPostId, Timestamp, UserId,
};
use crate::domain::marketplace::{Conversation, ConversationStatus, Message, SellerReview};
use crate::ports::{
    ConversationStore, InboxEntry, ListingReader, ListingSummary, MessageStore, ReviewStore,
};

#[derive(Default)]
struct State {
    listings: HashMap<SellPostId, ListingSummary>,
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
    reviews: HashMap<ReviewId, SellerReview>,
}

/// In-memory implementation of the marketplace persistence ports.
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: RwLock<State>,
}

impl InMemoryMarketplace {
    /// Creates an empty in-memory marketplace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a listing into the catalog.
    pub async fn add_listing(&self, listing: ListingSummary) {
        self.state.write().await.listings.insert(listing.id, listing);
    }
}

fn unread_in(messages: &[Message], conversation_id: ConversationId, user: &UserId) -> u64 {
    messages
        .iter()
        .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(user))
        .count() as u64
}

#[async_trait]
impl ConversationStore for InMemoryMarketplace {
    async fn get_or_create(
        &self,
        sell_post_id: SellPostId,
        seller_id: &UserId,
        buyer_id: &UserId,
    ) -> Result<Conversation, DomainError> {
        // The single write lock is this store's uniqueness constraint:
        // concurrent first contacts serialize here and converge on one row.
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .conversations
            .values()
            .find(|c| c.sell_post_id == sell_post_id && &c.buyer_id == buyer_id)
        {
            return Ok(existing.clone());
        }

        let conversation = Conversation::start(sell_post_id, seller_id.clone(), buyer_id.clone());
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, DomainError> {
        Ok(self.state.read().await.conversations.get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<InboxEntry>, DomainError> {
        let state = self.state.read().await;
        let mut entries: Vec<InboxEntry> = state
            .conversations
            .values()
            .filter(|c| c.is_participant(user))
            .filter(|c| status.map_or(true, |s| c.status == s))
            .map(|c| {
                let last_message = state
                    .messages
                    .iter()
                    .filter(|m| m.conversation_id == c.id)
                    .max_by_key(|m| (m.created_at, m.id))
                    .cloned();
                let listing = state.listings.get(&c.sell_post_id);
                InboxEntry {
                    is_seller: &c.seller_id == user,
                    unread_count: unread_in(&state.messages, c.id, user),
                    listing_title: listing.map(|l| l.title.clone()).unwrap_or_default(),
                    listing_image: listing.and_then(|l| l.cover_image.clone()),
                    last_message,
                    conversation: c.clone(),
                }
            })
            .collect();

        entries.sort_by(|a, b| b.conversation.updated_at.cmp(&a.conversation.updated_at));
        Ok(entries)
    }

    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Conversation", id))?;
        conversation.status = status;
        Ok(())
    }

    async fn complete(
        &self,
        id: ConversationId,
        completed_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Conversation", id))?;
        conversation.transaction_completed = true;
        conversation.completed_at = Some(completed_at);
        conversation.status = ConversationStatus::Completed;
        conversation.updated_at = completed_at;
        Ok(())
    }

    async fn unread_badge_count(&self, user: &UserId) -> Result<u64, DomainError> {
        let state = self.state.read().await;
        let total = state
            .conversations
            .values()
            .filter(|c| c.is_participant(user) && c.status != ConversationStatus::Archived)
            .map(|c| unread_in(&state.messages, c.id, user))
            .sum();
        Ok(total)
    }

    async fn completed_count_for_seller(&self, seller: &UserId) -> Result<u64, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .conversations
            .values()
            .filter(|c| &c.seller_id == seller && c.transaction_completed)
            .count() as u64)
    }
}

#[async_trait]
impl MessageStore for InMemoryMarketplace {
    async fn append(&self, message: &Message) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| DomainError::not_found("Conversation", message.conversation_id))?;
        conversation.touch(message.created_at);
        state.messages.push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, DomainError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn recent(
        &self,
        conversation_id: ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        let mut messages = self.list_for_conversation(conversation_id).await?;
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.split_off(skip))
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let mut count = 0u64;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(reader))
        {
            if message.mark_read(at) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn unread_count(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let state = self.state.read().await;
        Ok(unread_in(&state.messages, conversation_id, user))
    }

    async fn total_unread(&self, user: &UserId) -> Result<u64, DomainError> {
        let state = self.state.read().await;
        let total = state
            .messages
            .iter()
            .filter(|m| {
                state
                    .conversations
                    .get(&m.conversation_id)
                    .is_some_and(|c| c.is_participant(user))
                    && m.is_unread_for(user)
            })
            .count() as u64;
        Ok(total)
    }

    async fn delete(&self, id: MessageId) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() == before {
            return Err(DomainError::not_found("Message", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for InMemoryMarketplace {
    async fn insert(&self, review: &SellerReview) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state
            .reviews
            .values()
            .any(|r| r.conversation_id == review.conversation_id)
        {
            return Err(DomainError::DuplicateReview(review.conversation_id.to_string()));
        }
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ReviewId) -> Result<Option<SellerReview>, DomainError> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<SellerReview>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .reviews
            .values()
            .find(|r| r.conversation_id == conversation_id)
            .cloned())
    }

    async fn update(&self, review: &SellerReview) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&review.id) {
            return Err(DomainError::not_found("Review", review.id));
        }
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn delete(&self, id: ReviewId) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        state
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Review", id))
    }

    async fn list_for_seller(&self, seller: &UserId) -> Result<Vec<SellerReview>, DomainError> {
        let state = self.state.read().await;
        let mut reviews: Vec<SellerReview> = state
            .reviews
            .values()
            .filter(|r| &r.seller_id == seller)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| (r.created_at, r.id));
        Ok(reviews)
    }
}

#[async_trait]
impl ListingReader for InMemoryMarketplace {
    async fn find_summary(&self, id: SellPostId) -> Result<Option<ListingSummary>, DomainError> {
        Ok(self.state.read().await.listings.get(&id).cloned())
    }
}
