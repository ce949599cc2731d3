//! Review service - post-transaction seller ratings and reputation stats.

use std::sync::Arc;

use crate::domain::foundation::{
    ConversationId, DomainError, Rating, ReviewId, Timestamp, UserId,
};
use crate::domain::marketplace::{RatingBreakdown, SellerReview, SellerStats};
use crate::ports::{ConversationStore, ReviewStore};

/// Input for creating a seller review.
///
/// `seller_id` is the client's idea of who it is rating; when present it
/// must agree with the conversation's seller. The persisted review always
/// uses the conversation's seller as authoritative.
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub conversation_id: ConversationId,
    pub reviewer_id: UserId,
    pub seller_id: Option<UserId>,
    pub rating: i32,
    pub communication: Option<i32>,
    pub description_accuracy: Option<i32>,
    pub meetup: Option<i32>,
    pub comment: Option<String>,
}

/// Partial update to an existing review; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub communication: Option<i32>,
    pub description_accuracy: Option<i32>,
    pub meetup: Option<i32>,
    pub comment: Option<String>,
}

/// Service over seller reviews and aggregate reputation.
#[derive(Clone)]
pub struct ReviewService {
    conversations: Arc<dyn ConversationStore>,
    reviews: Arc<dyn ReviewStore>,
}

impl ReviewService {
    /// Creates a new ReviewService.
    pub fn new(conversations: Arc<dyn ConversationStore>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self {
            conversations,
            reviews,
        }
    }

    /// Creates the one-time seller review for a completed conversation.
    ///
    /// Preconditions are checked in a fixed order so each violation reports
    /// its own error: conversation exists, transaction completed, reviewer is
    /// the buyer, seller matches, no prior review, ratings in range.
    pub async fn submit(&self, draft: ReviewDraft) -> Result<SellerReview, DomainError> {
        let conversation = self
            .conversations
            .find_by_id(draft.conversation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Conversation", draft.conversation_id))?;

        if !conversation.transaction_completed {
            return Err(DomainError::TransactionIncomplete(
                draft.conversation_id.to_string(),
            ));
        }
        if draft.reviewer_id != conversation.buyer_id {
            return Err(DomainError::permission(
                "only the buyer may review the seller",
            ));
        }
        if let Some(ref claimed_seller) = draft.seller_id {
            if claimed_seller != &conversation.seller_id {
                return Err(DomainError::SellerMismatch {
                    expected: conversation.seller_id.to_string(),
                    got: claimed_seller.to_string(),
                });
            }
        }
        if self
            .reviews
            .find_by_conversation(draft.conversation_id)
            .await?
            .is_some()
        {
            return Err(DomainError::DuplicateReview(
                draft.conversation_id.to_string(),
            ));
        }

        let rating = Rating::new(draft.rating)?;
        let breakdown = RatingBreakdown {
            communication: draft.communication.map(Rating::new).transpose()?,
            description_accuracy: draft.description_accuracy.map(Rating::new).transpose()?,
            meetup: draft.meetup.map(Rating::new).transpose()?,
        };

        let now = Timestamp::now();
        let review = SellerReview {
            id: ReviewId::new(),
            conversation_id: draft.conversation_id,
            sell_post_id: conversation.sell_post_id,
            reviewer_id: draft.reviewer_id,
            seller_id: conversation.seller_id,
            rating,
            breakdown,
            comment: draft.comment,
            created_at: now,
            updated_at: now,
        };

        // The unique key still backstops a racing duplicate.
        self.reviews.insert(&review).await?;

        tracing::info!(
            conversation_id = %review.conversation_id,
            seller = %review.seller_id,
            rating = review.rating.value(),
            "seller review created"
        );
        Ok(review)
    }

    /// Applies an author-only partial update.
    pub async fn update(
        &self,
        id: ReviewId,
        caller: &UserId,
        changes: ReviewChanges,
    ) -> Result<SellerReview, DomainError> {
        let mut review = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Review", id))?;

        if !review.is_author(caller) {
            return Err(DomainError::permission("only the author may edit a review"));
        }

        if let Some(rating) = changes.rating {
            review.rating = Rating::new(rating)?;
        }
        if let Some(value) = changes.communication {
            review.breakdown.communication = Some(Rating::new(value)?);
        }
        if let Some(value) = changes.description_accuracy {
            review.breakdown.description_accuracy = Some(Rating::new(value)?);
        }
        if let Some(value) = changes.meetup {
            review.breakdown.meetup = Some(Rating::new(value)?);
        }
        if let Some(comment) = changes.comment {
            review.comment = Some(comment);
        }
        review.updated_at = Timestamp::now();

        self.reviews.update(&review).await?;
        Ok(review)
    }

    /// Deletes a review. Allowed for its author, or for an admin caller.
    pub async fn delete(
        &self,
        id: ReviewId,
        caller: &UserId,
        is_admin: bool,
    ) -> Result<(), DomainError> {
        let review = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Review", id))?;

        if !is_admin && !review.is_author(caller) {
            return Err(DomainError::permission(
                "only the author or an admin may delete a review",
            ));
        }
        self.reviews.delete(id).await
    }

    /// Aggregate reputation for a seller: overall and per-dimension averages,
    /// completed-sales count, and the 1-5 star histogram. All zeros for a
    /// seller with no reviews.
    pub async fn seller_stats(&self, seller: &UserId) -> Result<SellerStats, DomainError> {
        let reviews = self.reviews.list_for_seller(seller).await?;
        let completed_sales = self.conversations.completed_count_for_seller(seller).await?;
        Ok(SellerStats::from_reviews(&reviews, completed_sales))
    }
}
