//! PostgreSQL implementation of ReviewStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    ConversationId, DomainError, Rating, ReviewId, SellPostId, Timestamp, UserId,
};
use crate::domain::marketplace::{RatingBreakdown, SellerReview};
use crate::ports::ReviewStore;

use super::{db_err, is_unique_violation, stored_user_id};

/// PostgreSQL implementation of ReviewStore.
///
/// The unique constraint on `conversation_id` is the final arbiter of the
/// one-review rule; a racing duplicate surfaces as `DuplicateReview`.
#[derive(Clone)]
pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
    /// Creates a new PostgresReviewStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PostgresReviewStore {
    async fn insert(&self, review: &SellerReview) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO seller_reviews (
                id, conversation_id, sell_post_id, reviewer_id, seller_id,
                rating, communication_rating, description_accuracy_rating,
                meetup_rating, comment, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.conversation_id.as_uuid())
        .bind(review.sell_post_id.as_uuid())
        .bind(review.reviewer_id.as_str())
        .bind(review.seller_id.as_str())
        .bind(review.rating.value() as i32)
        .bind(review.breakdown.communication.map(|r| r.value() as i32))
        .bind(review.breakdown.description_accuracy.map(|r| r.value() as i32))
        .bind(review.breakdown.meetup.map(|r| r.value() as i32))
        .bind(&review.comment)
        .bind(review.created_at.as_datetime())
        .bind(review.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateReview(review.conversation_id.to_string())
            } else {
                db_err("Failed to insert review", e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: ReviewId) -> Result<Option<SellerReview>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, sell_post_id, reviewer_id, seller_id,
                   rating, communication_rating, description_accuracy_rating,
                   meetup_rating, comment, created_at, updated_at
            FROM seller_reviews
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch review", e))?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<SellerReview>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, sell_post_id, reviewer_id, seller_id,
                   rating, communication_rating, description_accuracy_rating,
                   meetup_rating, comment, created_at, updated_at
            FROM seller_reviews
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch review by conversation", e))?;

        row.as_ref().map(review_from_row).transpose()
    }

    async fn update(&self, review: &SellerReview) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE seller_reviews SET
                rating = $2,
                communication_rating = $3,
                description_accuracy_rating = $4,
                meetup_rating = $5,
                comment = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.rating.value() as i32)
        .bind(review.breakdown.communication.map(|r| r.value() as i32))
        .bind(review.breakdown.description_accuracy.map(|r| r.value() as i32))
        .bind(review.breakdown.meetup.map(|r| r.value() as i32))
        .bind(&review.comment)
        .bind(review.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update review", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Review", review.id));
        }
        Ok(())
    }

    async fn delete(&self, id: ReviewId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM seller_reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("Failed to delete review", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Review", id));
        }
        Ok(())
    }

    async fn list_for_seller(&self, seller: &UserId) -> Result<Vec<SellerReview>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sell_post_id, reviewer_id, seller_id,
                   rating, communication_rating, description_accuracy_rating,
                   meetup_rating, comment, created_at, updated_at
            FROM seller_reviews
            WHERE seller_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(seller.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list seller reviews", e))?;

        rows.iter().map(review_from_row).collect()
    }
}

// === Helper Functions ===

fn rating_column(row: &sqlx::postgres::PgRow, column: &str) -> Result<Option<Rating>, DomainError> {
    let value: Option<i32> = row.get(column);
    value
        .map(Rating::new)
        .transpose()
        .map_err(|_| DomainError::Database(format!("corrupt stored rating in {}", column)))
}

fn review_from_row(row: &sqlx::postgres::PgRow) -> Result<SellerReview, DomainError> {
    let id: uuid::Uuid = row.get("id");
    let conversation_id: uuid::Uuid = row.get("conversation_id");
    let sell_post_id: uuid::Uuid = row.get("sell_post_id");
    let rating: i32 = row.get("rating");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(SellerReview {
        id: ReviewId::from_uuid(id),
        conversation_id: ConversationId::from_uuid(conversation_id),
        sell_post_id: SellPostId::from_uuid(sell_post_id),
        reviewer_id: stored_user_id(row.get("reviewer_id"))?,
        seller_id: stored_user_id(row.get("seller_id"))?,
        rating: Rating::new(rating)
            .map_err(|_| DomainError::Database(format!("corrupt stored rating: {}", rating)))?,
        breakdown: RatingBreakdown {
            communication: rating_column(row, "communication_rating")?,
            description_accuracy: rating_column(row, "description_accuracy_rating")?,
            meetup: rating_column(row, "meetup_rating")?,
        },
        comment: row.get("comment"),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
