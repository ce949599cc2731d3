//! HTTP handlers for conversation endpoints.
//!
//! These handlers connect Axum routes to the application services.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::foundation::{ConversationId, MessageId};
use crate::ports::{RateLimitDecision, RateLimitKey};

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::AppState;
use super::dto::{
    ConversationAction, ConversationActionRequest, ConversationDetailView, ConversationView,
    CountView, InboxEntryView, ListParams, MessageView, OpenConversationRequest,
    SendMessageRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/conversations
// ════════════════════════════════════════════════════════════════════════════════

/// Lists the caller's conversations with unread counts, newest activity first.
pub async fn list_conversations(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .conversations
        .list_for_user(&user.id, params.status)
        .await?;

    let views: Vec<InboxEntryView> = entries.iter().map(InboxEntryView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/conversations
// ════════════════════════════════════════════════════════════════════════════════

/// Get-or-create: opens (or returns) the caller's conversation on a listing.
pub async fn open_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<OpenConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .conversations
        .get_or_create(body.sell_post_id, &user.id)
        .await?;

    Ok((StatusCode::OK, Json(ConversationDetailView::from(&detail))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/conversations/unread-count
// ════════════════════════════════════════════════════════════════════════════════

/// Unread badge: messages awaiting the caller across non-archived threads.
pub async fn unread_count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.conversations.unread_badge_count(&user.id).await?;
    Ok((StatusCode::OK, Json(CountView { count })))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/conversations/{id}
// ════════════════════════════════════════════════════════════════════════════════

/// Hydrated conversation detail: thread + listing + messages + review.
pub async fn get_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let detail = state
        .conversations
        .get_with_messages(conversation_id, &user.id)
        .await?;

    Ok((StatusCode::OK, Json(ConversationDetailView::from(&detail))))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/conversations/{id}/messages
// ════════════════════════════════════════════════════════════════════════════════

/// Appends a message over the durable path. This is the only way to send -
/// the realtime channel never carries sends, so a dropped socket can never
/// lose one.
pub async fn send_message(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    if let Some(ref limiter) = state.rate_limiter {
        let key = RateLimitKey::user_resource(&user.id, "send_message");
        match limiter.check(&key).await {
            Ok(RateLimitDecision::Denied { retry_after_secs }) => {
                return Err(ApiError::rate_limited(retry_after_secs));
            }
            Ok(RateLimitDecision::Allowed { .. }) => {}
            Err(e) => {
                // Fail open: a broken limiter must not take messaging down.
                tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            }
        }
    }

    let message = state
        .messages
        .create(conversation_id, &user.id, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageView::from(&message))))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/conversations/{id}/read
// ════════════════════════════════════════════════════════════════════════════════

/// Marks the caller's incoming messages read. Idempotent.
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let count = state.messages.mark_read(conversation_id, &user.id).await?;
    Ok((StatusCode::OK, Json(CountView { count })))
}

// ════════════════════════════════════════════════════════════════════════════════
// PATCH /api/conversations/{id}
// ════════════════════════════════════════════════════════════════════════════════

/// Status transitions: `complete` finalizes the transaction (one-way),
/// `archive`/`block` flip the conversation status.
pub async fn patch_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(body): Json<ConversationActionRequest>,
) -> Result<Response, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    match body.action {
        ConversationAction::Complete => {
            let conversation = state
                .conversations
                .complete_transaction(conversation_id, &user.id)
                .await?;
            Ok((StatusCode::OK, Json(ConversationView::from(&conversation))).into_response())
        }
        ConversationAction::Archive => {
            state.conversations.archive(conversation_id, &user.id).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        ConversationAction::Block => {
            state.conversations.block(conversation_id, &user.id).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DELETE /api/messages/{id}
// ════════════════════════════════════════════════════════════════════════════════

/// Hard-deletes a message; sender only.
pub async fn delete_message(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id: MessageId = message_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid message ID format"))?;

    state.messages.delete(message_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════════

fn parse_conversation_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid conversation ID format"))
}
