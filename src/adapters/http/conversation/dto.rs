//! HTTP DTOs for conversation endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::ConversationDetail;
use crate::domain::foundation::SellPostId;
use crate::domain::marketplace::{
    Conversation, ConversationStatus, Message, ParticipantRole,
};
use crate::ports::{InboxEntry, ListingSummary};

use super::super::review::dto::ReviewView;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// View of a conversation for API responses.
///
/// Wire DTOs derive both directions: the server serializes them, the
/// conversation-view client deserializes the same shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: String,
    pub sell_post_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub status: ConversationStatus,
    pub transaction_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            sell_post_id: conversation.sell_post_id.to_string(),
            seller_id: conversation.seller_id.to_string(),
            buyer_id: conversation.buyer_id.to_string(),
            status: conversation.status,
            transaction_completed: conversation.transaction_completed,
            completed_at: conversation.completed_at.map(|t| t.to_rfc3339()),
            created_at: conversation.created_at.to_rfc3339(),
            updated_at: conversation.updated_at.to_rfc3339(),
        }
    }
}

/// View of a message for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id.to_string(),
            content: message.content.clone(),
            created_at: message.created_at.to_rfc3339(),
            read_at: message.read_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Fully hydrated conversation: thread, listing, history, pending review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetailView {
    pub conversation: ConversationView,
    pub viewer_role: ParticipantRole,
    pub listing: ListingSummary,
    pub messages: Vec<MessageView>,
    pub review: Option<ReviewView>,
}

impl From<&ConversationDetail> for ConversationDetailView {
    fn from(detail: &ConversationDetail) -> Self {
        Self {
            conversation: ConversationView::from(&detail.conversation),
            viewer_role: detail.viewer_role,
            listing: detail.listing.clone(),
            messages: detail.messages.iter().map(MessageView::from).collect(),
            review: detail.review.as_ref().map(ReviewView::from),
        }
    }
}

/// One inbox row: the conversation plus its display aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntryView {
    pub conversation: ConversationView,
    pub is_seller: bool,
    pub unread_count: u64,
    pub listing_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_image: Option<String>,
    pub last_message: Option<MessageView>,
}

impl From<&InboxEntry> for InboxEntryView {
    fn from(entry: &InboxEntry) -> Self {
        Self {
            conversation: ConversationView::from(&entry.conversation),
            is_seller: entry.is_seller,
            unread_count: entry.unread_count,
            listing_title: entry.listing_title.clone(),
            listing_image: entry.listing_image.clone(),
            last_message: entry.last_message.as_ref().map(MessageView::from),
        }
    }
}

/// Unread badge / read-mark count payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountView {
    pub count: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/conversations` - a buyer's first contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub sell_post_id: SellPostId,
}

/// Body of `POST /api/conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Body of `PATCH /api/conversations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationActionRequest {
    pub action: ConversationAction,
}

/// The status transitions a participant may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationAction {
    Complete,
    Archive,
    Block,
}

/// Query parameters for the inbox listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    pub status: Option<ConversationStatus>,
}
