//! SellerReview entity and aggregate seller statistics.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ConversationId, Rating, ReviewId, SellPostId, Timestamp, UserId,
};

/// Optional per-dimension sub-ratings attached to a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    pub communication: Option<Rating>,
    pub description_accuracy: Option<Rating>,
    pub meetup: Option<Rating>,
}

/// A one-time rating of a seller, tied to one completed conversation.
///
/// Uniqueness on `conversation_id` enforces the one-review rule at the
/// storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerReview {
    pub id: ReviewId,
    pub conversation_id: ConversationId,
    pub sell_post_id: SellPostId,
    pub reviewer_id: UserId,
    pub seller_id: UserId,
    pub rating: Rating,
    pub breakdown: RatingBreakdown,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SellerReview {
    /// Whether `user` may edit this review.
    pub fn is_author(&self, user: &UserId) -> bool {
        &self.reviewer_id == user
    }
}

/// Aggregate reputation figures for a seller.
///
/// All averages are 0.0 (never NaN) when the seller has no reviews, and the
/// distribution indexes star values 1 through 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub average_rating: f64,
    pub communication_avg: f64,
    pub description_accuracy_avg: f64,
    pub meetup_avg: f64,
    pub review_count: u64,
    pub completed_sales: u64,
    pub distribution: [u64; 5],
}

impl SellerStats {
    /// Stats for a seller with no reviews: all zeros.
    pub fn empty() -> Self {
        Self {
            average_rating: 0.0,
            communication_avg: 0.0,
            description_accuracy_avg: 0.0,
            meetup_avg: 0.0,
            review_count: 0,
            completed_sales: 0,
            distribution: [0; 5],
        }
    }

    /// Computes stats from a seller's reviews.
    ///
    /// Sub-dimension averages run over the reviews that carry that
    /// sub-rating; a dimension nobody rated stays 0.
    pub fn from_reviews(reviews: &[SellerReview], completed_sales: u64) -> Self {
        if reviews.is_empty() {
            return Self {
                completed_sales,
                ..Self::empty()
            };
        }

        let mut distribution = [0u64; 5];
        let mut total = 0u64;
        for review in reviews {
            distribution[review.rating.bucket()] += 1;
            total += review.rating.value() as u64;
        }

        Self {
            average_rating: total as f64 / reviews.len() as f64,
            communication_avg: dimension_avg(reviews, |r| r.breakdown.communication),
            description_accuracy_avg: dimension_avg(reviews, |r| r.breakdown.description_accuracy),
            meetup_avg: dimension_avg(reviews, |r| r.breakdown.meetup),
            review_count: reviews.len() as u64,
            completed_sales,
            distribution,
        }
    }
}

fn dimension_avg(
    reviews: &[SellerReview],
    dimension: impl Fn(&SellerReview) -> Option<Rating>,
) -> f64 {
    let values: Vec<u8> = reviews.iter().filter_map(|r| dimension(r).map(|d| d.value())).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| *v as u64).sum::<u64>() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32, communication: Option<i32>) -> SellerReview {
        SellerReview {
            id: ReviewId::new(),
            conversation_id: ConversationId::new(),
            sell_post_id: SellPostId::new(),
            reviewer_id: UserId::new("buyer-1").unwrap(),
            seller_id: UserId::new("seller-1").unwrap(),
            rating: Rating::new(rating).unwrap(),
            breakdown: RatingBreakdown {
                communication: communication.map(|v| Rating::new(v).unwrap()),
                ..Default::default()
            },
            comment: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn author_check_matches_reviewer() {
        let r = review(5, None);
        assert!(r.is_author(&UserId::new("buyer-1").unwrap()));
        assert!(!r.is_author(&UserId::new("seller-1").unwrap()));
    }

    #[test]
    fn empty_stats_are_all_zero() {
        let stats = SellerStats::empty();
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.communication_avg, 0.0);
        assert_eq!(stats.distribution, [0; 5]);
        assert_eq!(stats.review_count, 0);
    }

    #[test]
    fn stats_from_no_reviews_never_nan() {
        let stats = SellerStats::from_reviews(&[], 3);
        assert_eq!(stats.average_rating, 0.0);
        assert!(!stats.average_rating.is_nan());
        assert_eq!(stats.completed_sales, 3);
    }

    #[test]
    fn stats_average_and_distribution() {
        let reviews = vec![review(5, None), review(4, None), review(5, None)];
        let stats = SellerStats::from_reviews(&reviews, 3);

        assert!((stats.average_rating - 14.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.distribution, [0, 0, 0, 1, 2]);
        assert_eq!(stats.review_count, 3);
    }

    #[test]
    fn sub_dimension_averages_only_rated_reviews() {
        let reviews = vec![review(5, Some(4)), review(3, None), review(1, Some(2))];
        let stats = SellerStats::from_reviews(&reviews, 0);

        // Only the two reviews with a communication rating count.
        assert!((stats.communication_avg - 3.0).abs() < f64::EPSILON);
        // Nobody rated meetup.
        assert_eq!(stats.meetup_avg, 0.0);
    }
}
