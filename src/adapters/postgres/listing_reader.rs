//! PostgreSQL implementation of ListingReader.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{BookId, DomainError, SellPostId};
use crate::domain::marketplace::{Condition, ListingStatus};
use crate::ports::{BookSummary, ListingReader, ListingSummary, UserSummary};

use super::{db_err, stored_user_id};

/// PostgreSQL implementation of ListingReader.
///
/// Read-only: listing mutations belong to the catalog side of the platform.
#[derive(Clone)]
pub struct PostgresListingReader {
    pool: PgPool,
}

impl PostgresListingReader {
    /// Creates a new PostgresListingReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingReader for PostgresListingReader {
    async fn find_summary(&self, id: SellPostId) -> Result<Option<ListingSummary>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT sp.id, sp.title, sp.price_cents, sp.negotiable, sp.condition,
                   sp.status, sp.city, sp.images[1] AS cover_image,
                   u.id AS seller_id, u.display_name AS seller_name,
                   b.id AS book_id, b.title AS book_title, b.author AS book_author
            FROM sell_posts sp
            JOIN users u ON u.id = sp.seller_id
            LEFT JOIN books b ON b.id = sp.book_id
            WHERE sp.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch listing", e))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let listing_id: uuid::Uuid = row.get("id");
        let condition_str: &str = row.get("condition");
        let status_str: &str = row.get("status");

        let seller = UserSummary {
            id: stored_user_id(row.get("seller_id"))?,
            display_name: row.get("seller_name"),
        };

        let book = match row.get::<Option<uuid::Uuid>, _>("book_id") {
            Some(book_id) => Some(BookSummary {
                id: BookId::from_uuid(book_id),
                title: row.get("book_title"),
                author: row.get("book_author"),
            }),
            None => None,
        };

        Ok(Some(ListingSummary {
            id: SellPostId::from_uuid(listing_id),
            title: row.get("title"),
            price_cents: row.get("price_cents"),
            negotiable: row.get("negotiable"),
            condition: str_to_condition(condition_str)?,
            status: str_to_listing_status(status_str)?,
            city: row.get("city"),
            cover_image: row.get("cover_image"),
            seller,
            book,
        }))
    }
}

// === Helper Functions ===

fn str_to_condition(s: &str) -> Result<Condition, DomainError> {
    match s {
        "NEW" => Ok(Condition::New),
        "LIKE_NEW" => Ok(Condition::LikeNew),
        "GOOD" => Ok(Condition::Good),
        "FAIR" => Ok(Condition::Fair),
        "POOR" => Ok(Condition::Poor),
        _ => Err(DomainError::Database(format!("Invalid condition: {}", s))),
    }
}

fn str_to_listing_status(s: &str) -> Result<ListingStatus, DomainError> {
    match s {
        "AVAILABLE" => Ok(ListingStatus::Available),
        "PENDING" => Ok(ListingStatus::Pending),
        "SOLD" => Ok(ListingStatus::Sold),
        "HIDDEN" => Ok(ListingStatus::Hidden),
        _ => Err(DomainError::Database(format!("Invalid listing status: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_mapping_covers_all_variants() {
        for (s, expected) in [
            ("NEW", Condition::New),
            ("LIKE_NEW", Condition::LikeNew),
            ("GOOD", Condition::Good),
            ("FAIR", Condition::Fair),
            ("POOR", Condition::Poor),
        ] {
            assert_eq!(str_to_condition(s).unwrap(), expected);
        }
        assert!(str_to_condition("MINT").is_err());
    }

    #[test]
    fn listing_status_mapping_covers_all_variants() {
        for (s, expected) in [
            ("AVAILABLE", ListingStatus::Available),
            ("PENDING", ListingStatus::Pending),
            ("SOLD", ListingStatus::Sold),
            ("HIDDEN", ListingStatus::Hidden),
        ] {
            assert_eq!(str_to_listing_status(s).unwrap(), expected);
        }
        assert!(str_to_listing_status("GONE").is_err());
    }
}
