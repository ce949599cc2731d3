//! HTTP DTOs for review endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::marketplace::SellerReview;

/// View of a seller review for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: String,
    pub conversation_id: String,
    pub sell_post_id: String,
    pub reviewer_id: String,
    pub seller_id: String,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_accuracy_rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meetup_rating: Option<i32>,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&SellerReview> for ReviewView {
    fn from(review: &SellerReview) -> Self {
        Self {
            id: review.id.to_string(),
            conversation_id: review.conversation_id.to_string(),
            sell_post_id: review.sell_post_id.to_string(),
            reviewer_id: review.reviewer_id.to_string(),
            seller_id: review.seller_id.to_string(),
            rating: review.rating.value() as i32,
            communication_rating: review.breakdown.communication.map(|r| r.value() as i32),
            description_accuracy_rating: review
                .breakdown
                .description_accuracy
                .map(|r| r.value() as i32),
            meetup_rating: review.breakdown.meetup.map(|r| r.value() as i32),
            comment: review.comment.clone(),
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

/// Body of `POST /api/conversations/{id}/review`.
///
/// `sellerId` is optional; when the client includes it, it must agree with
/// the conversation's seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub rating: i32,
    pub communication_rating: Option<i32>,
    pub description_accuracy_rating: Option<i32>,
    pub meetup_rating: Option<i32>,
    pub comment: Option<String>,
    pub seller_id: Option<UserId>,
}

/// Body of `PATCH /api/reviews/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub communication_rating: Option<i32>,
    pub description_accuracy_rating: Option<i32>,
    pub meetup_rating: Option<i32>,
    pub comment: Option<String>,
}
