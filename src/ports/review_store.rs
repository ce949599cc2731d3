//! Review store port.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, ReviewId, UserId};
use crate::domain::marketplace::SellerReview;

/// Store port for seller reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts a review.
    ///
    /// # Errors
    ///
    /// - `DuplicateReview` if the conversation already has one (unique key)
    async fn insert(&self, review: &SellerReview) -> Result<(), DomainError>;

    /// Finds a review by id.
    async fn find_by_id(&self, id: ReviewId) -> Result<Option<SellerReview>, DomainError>;

    /// Finds the review attached to a conversation, if any.
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<SellerReview>, DomainError>;

    /// Persists an updated review.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the review doesn't exist
    async fn update(&self, review: &SellerReview) -> Result<(), DomainError>;

    /// Deletes a review.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the review doesn't exist
    async fn delete(&self, id: ReviewId) -> Result<(), DomainError>;

    /// All reviews received by a seller.
    async fn list_for_seller(&self, seller: &UserId) -> Result<Vec<SellerReview>, DomainError>;
}
