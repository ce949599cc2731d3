//! Integration tests for the conversation REST API.
//!
//! These tests drive the full `/api` router - auth middleware, handlers,
//! DTO serialization, and error mapping - over the in-memory store:
//! 1. Bearer tokens gate every route
//! 2. Request/response bodies use the camelCase wire shapes
//! 3. Domain errors surface as their status + stable code

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use bookbarter::adapters::auth::TrustedTokenValidator;
use bookbarter::adapters::http::{api_router, AppState};
use bookbarter::adapters::memory::InMemoryMarketplace;
use bookbarter::adapters::websocket::{RoomManager, WebSocketState};
use bookbarter::application::{ConversationService, MessageService, ReviewService};
use bookbarter::domain::foundation::{BookId, SellPostId, UserId};
use bookbarter::domain::marketplace::{Condition, ListingStatus};
use bookbarter::ports::{
    BookSummary, ConversationNotifier, ListingSummary, NullNotifier, SessionValidator, UserSummary,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SELLER_TOKEN: &str = "user:seller-1";
const BUYER_TOKEN: &str = "user:buyer-1";

fn listing(id: SellPostId) -> ListingSummary {
    ListingSummary {
        id,
        title: "A Wizard of Earthsea".to_string(),
        price_cents: 650,
        negotiable: true,
        condition: Condition::Fair,
        status: ListingStatus::Available,
        city: Some("Pusan".to_string()),
        cover_image: None,
        seller: UserSummary {
            id: UserId::new("seller-1").unwrap(),
            display_name: "Sam".to_string(),
        },
        book: Some(BookSummary {
            id: BookId::new(),
            title: "A Wizard of Earthsea".to_string(),
            author: Some("Ursula K. Le Guin".to_string()),
        }),
    }
}

async fn test_app() -> (Router, SellPostId) {
    let store = Arc::new(InMemoryMarketplace::new());
    let notifier: Arc<dyn ConversationNotifier> = Arc::new(NullNotifier);

    let sell_post_id = SellPostId::new();
    store.add_listing(listing(sell_post_id)).await;

    let conversations = ConversationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let messages = MessageService::new(store.clone(), store.clone(), notifier);
    let reviews = ReviewService::new(store.clone(), store.clone());

    let sessions: Arc<dyn SessionValidator> = Arc::new(TrustedTokenValidator);
    let ws_state = WebSocketState::new(
        Arc::new(RoomManager::default()),
        sessions.clone(),
        store,
        messages.clone(),
    );

    let app = api_router(
        AppState::new(conversations, messages, reviews),
        ws_state,
        sessions,
    );
    (app, sell_post_id)
}

async fn send(
    app: &Router,
    method: http::Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(value) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Opens the buyer's conversation on the seeded listing, returning its id.
async fn open_conversation(app: &Router, sell_post_id: SellPostId) -> String {
    let response = send(
        app,
        http::Method::POST,
        "/api/conversations",
        Some(BUYER_TOKEN),
        Some(json!({ "sellPostId": sell_post_id.to_string() })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    body["conversation"]["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn routes_require_a_bearer_token() {
    let (app, sell_post_id) = test_app().await;

    let response = send(
        &app,
        http::Method::POST,
        "/api/conversations",
        None,
        Some(json!({ "sellPostId": sell_post_id.to_string() })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, http::Method::GET, "/api/conversations", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let (app, _) = test_app().await;

    let response = send(
        &app,
        http::Method::GET,
        "/api/conversations",
        Some("not-a-valid-token"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Conversation lifecycle over the wire
// =============================================================================

#[tokio::test]
async fn open_send_and_read_round_trip() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    // Opening again returns the same thread.
    let again = open_conversation(&app, sell_post_id).await;
    assert_eq!(id, again);

    // The buyer sends over the durable path.
    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/messages", id),
        Some(BUYER_TOKEN),
        Some(json!({ "content": "Hi, is this available?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let message = json_body(response).await;
    assert_eq!(message["senderId"], "buyer-1");
    assert_eq!(message["content"], "Hi, is this available?");
    assert!(message["readAt"].is_null());

    // The seller's inbox shows the unread message.
    let response = send(&app, http::Method::GET, "/api/conversations", Some(SELLER_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let inbox = json_body(response).await;
    assert_eq!(inbox[0]["unreadCount"], 1);
    assert_eq!(inbox[0]["isSeller"], true);
    assert_eq!(inbox[0]["lastMessage"]["content"], "Hi, is this available?");

    // Read-marking is idempotent.
    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/read", id),
        Some(SELLER_TOKEN),
        None,
    )
    .await;
    assert_eq!(json_body(response).await["count"], 1);

    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/read", id),
        Some(SELLER_TOKEN),
        None,
    )
    .await;
    assert_eq!(json_body(response).await["count"], 0);

    // The hydrated detail now carries the receipt.
    let response = send(
        &app,
        http::Method::GET,
        &format!("/api/conversations/{}", id),
        Some(BUYER_TOKEN),
        None,
    )
    .await;
    let detail = json_body(response).await;
    assert!(!detail["messages"][0]["readAt"].is_null());
    assert_eq!(detail["viewerRole"], "buyer");
}

#[tokio::test]
async fn strangers_cannot_read_a_conversation() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    let response = send(
        &app,
        http::Method::GET,
        &format!("/api/conversations/{}", id),
        Some("user:stranger"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn blocked_conversation_send_maps_to_conflict() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    let response = send(
        &app,
        http::Method::PATCH,
        &format!("/api/conversations/{}", id),
        Some(SELLER_TOKEN),
        Some(json!({ "action": "block" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/messages", id),
        Some(BUYER_TOKEN),
        Some(json!({ "content": "hello?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "CONVERSATION_BLOCKED");
}

#[tokio::test]
async fn invalid_conversation_id_is_bad_request() {
    let (app, _) = test_app().await;

    let response = send(
        &app,
        http::Method::GET,
        "/api/conversations/not-a-uuid",
        Some(BUYER_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Completion and review over the wire
// =============================================================================

#[tokio::test]
async fn complete_and_review_flow() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    let response = send(
        &app,
        http::Method::PATCH,
        &format!("/api/conversations/{}", id),
        Some(SELLER_TOKEN),
        Some(json!({ "action": "complete" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let conversation = json_body(response).await;
    assert_eq!(conversation["transactionCompleted"], true);
    assert_eq!(conversation["status"], "COMPLETED");

    // Completion is one-way.
    let response = send(
        &app,
        http::Method::PATCH,
        &format!("/api/conversations/{}", id),
        Some(BUYER_TOKEN),
        Some(json!({ "action": "complete" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "ALREADY_COMPLETED");

    // The buyer leaves the one-time review.
    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/review", id),
        Some(BUYER_TOKEN),
        Some(json!({ "rating": 5, "communicationRating": 4, "comment": "great" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let review = json_body(response).await;
    assert_eq!(review["rating"], 5);
    assert_eq!(review["sellerId"], "seller-1");

    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/review", id),
        Some(BUYER_TOKEN),
        Some(json!({ "rating": 4 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "DUPLICATE_REVIEW");

    // Reputation reflects the review and the completed sale.
    let response = send(
        &app,
        http::Method::GET,
        "/api/sellers/seller-1/stats",
        Some(BUYER_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["reviewCount"], 1);
    assert_eq!(stats["completedSales"], 1);
    assert_eq!(stats["averageRating"], 5.0);
    assert_eq!(stats["distribution"], json!([0, 0, 0, 0, 1]));
}

#[tokio::test]
async fn review_before_completion_is_rejected_with_conflict() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/review", id),
        Some(BUYER_TOKEN),
        Some(json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "TRANSACTION_INCOMPLETE");
}

#[tokio::test]
async fn out_of_range_rating_is_unprocessable() {
    let (app, sell_post_id) = test_app().await;
    let id = open_conversation(&app, sell_post_id).await;

    send(
        &app,
        http::Method::PATCH,
        &format!("/api/conversations/{}", id),
        Some(SELLER_TOKEN),
        Some(json!({ "action": "complete" })),
    )
    .await;

    let response = send(
        &app,
        http::Method::POST,
        &format!("/api/conversations/{}/review", id),
        Some(BUYER_TOKEN),
        Some(json!({ "rating": 6 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["code"], "INVALID_RATING");
}
