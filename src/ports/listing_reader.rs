//! Listing reader port.
//!
//! Listings (and the users/books they reference) are owned by the catalog
//! side of the platform; the conversation layer only reads them - to derive
//! the seller of a new conversation and to hydrate conversation views.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BookId, DomainError, SellPostId, UserId};
use crate::domain::marketplace::{Condition, ListingStatus};

/// Minimal public profile of a marketplace user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
}

/// Summary of the catalog book a listing links to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
}

/// Listing fields needed to open and render a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: SellPostId,
    pub title: String,
    pub price_cents: i64,
    pub negotiable: bool,
    pub condition: Condition,
    pub status: ListingStatus,
    pub city: Option<String>,
    pub cover_image: Option<String>,
    pub seller: UserSummary,
    pub book: Option<BookSummary>,
}

/// Read port over the listing catalog.
#[async_trait]
pub trait ListingReader: Send + Sync {
    /// Finds a listing summary by id, hydrated with seller and book.
    async fn find_summary(&self, id: SellPostId) -> Result<Option<ListingSummary>, DomainError>;
}
