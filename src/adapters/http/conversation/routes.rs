//! Axum routes for conversation endpoints.
//!
//! Defines the routing table for all conversation-related HTTP endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{
    delete_message, get_conversation, list_conversations, mark_read, open_conversation,
    patch_conversation, send_message, unread_count,
};

/// Creates routes for conversation endpoints.
///
/// REST Endpoints:
/// - GET    /conversations - inbox with unread counts
/// - POST   /conversations - get-or-create on a listing
/// - GET    /conversations/unread-count - notification badge
/// - GET    /conversations/{id} - hydrated detail
/// - POST   /conversations/{id}/messages - append message (durable path)
/// - POST   /conversations/{id}/read - mark incoming messages read
/// - PATCH  /conversations/{id} - complete / archive / block
/// - DELETE /messages/{id} - sender-only hard delete
///
/// WebSocket (separate router):
/// - GET    /conversations/{id}/live - realtime events
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations).post(open_conversation))
        .route("/conversations/unread-count", get(unread_count))
        .route(
            "/conversations/{conversation_id}",
            get(get_conversation).patch(patch_conversation),
        )
        .route("/conversations/{conversation_id}/messages", post(send_message))
        .route("/conversations/{conversation_id}/read", post(mark_read))
        .route("/messages/{message_id}", delete(delete_message))
}
