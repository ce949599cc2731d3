//! SellPost entity - a hard-copy book listing.
//!
//! Listings are owned by the selling user. This service reads them to
//! resolve conversation participants and hydrate conversation views;
//! listing CRUD itself lives with the catalog.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BookId, SellPostId, Timestamp, UserId};

/// Physical condition of the offered copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

/// Listing lifecycle status.
///
/// HIDDEN is the soft-delete state: the listing stays in storage but is
/// invisible to everyone except its seller (and admins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
    Hidden,
}

/// A for-sale listing.
///
/// Invariant: `sold_at` is set iff `status == Sold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellPost {
    pub id: SellPostId,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub negotiable: bool,
    pub condition: Condition,
    pub images: Vec<String>,
    pub book_id: Option<BookId>,
    pub seller_id: UserId,
    pub city: Option<String>,
    pub status: ListingStatus,
    pub created_at: Timestamp,
    pub sold_at: Option<Timestamp>,
}

impl SellPost {
    /// Whether the listing is visible to `user`.
    ///
    /// Hidden listings are visible only to their seller.
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.status != ListingStatus::Hidden || &self.seller_id == user
    }

    /// Marks the listing sold, keeping the sold_at/status invariant.
    pub fn mark_sold(&mut self, now: Timestamp) {
        self.status = ListingStatus::Sold;
        self.sold_at = Some(now);
    }

    /// Soft-deletes the listing.
    pub fn hide(&mut self) {
        self.status = ListingStatus::Hidden;
    }

    /// Checks the sold_at/status invariant.
    pub fn invariant_holds(&self) -> bool {
        (self.status == ListingStatus::Sold) == self.sold_at.is_some()
    }
}
