//! WebSocket upgrade handler for realtime conversation connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Validate the token and the caller's participant-ship
//! 2. Upgrade to WebSocket
//! 3. Join the conversation room
//! 4. Forward events / process client messages until disconnect
//! 5. Clean up room membership

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};

use crate::application::MessageService;
use crate::domain::foundation::{ConversationId, Timestamp, UserId};
use crate::ports::{ConversationStore, SessionValidator};

use super::messages::{
    ClientMessage, ConnectedMessage, ConversationEvent, ConversationEventKind, ErrorMessage,
    PongMessage, ServerMessage,
};
use super::rooms::{ClientId, RoomManager};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Room manager for conversation-based routing.
    pub room_manager: Arc<RoomManager>,
    /// Token validation (the browser passes the token as a query parameter
    /// since WebSocket upgrades cannot carry custom headers).
    pub sessions: Arc<dyn SessionValidator>,
    /// Used to verify the caller is a participant before joining the room.
    pub conversations: Arc<dyn ConversationStore>,
    /// Read marking over the socket goes through the same service as HTTP.
    pub message_service: MessageService,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(
        room_manager: Arc<RoomManager>,
        sessions: Arc<dyn SessionValidator>,
        conversations: Arc<dyn ConversationStore>,
        message_service: MessageService,
    ) -> Self {
        Self {
            room_manager,
            sessions,
            conversations,
            message_service,
        }
    }
}

/// Query parameters for the live endpoint.
#[derive(Debug, Deserialize)]
pub struct LiveParams {
    token: String,
}

/// Handle WebSocket upgrade requests for a conversation.
///
/// Route: `GET /api/conversations/{conversation_id}/live?token=...`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    Query(params): Query<LiveParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let conversation_id: ConversationId = match conversation_id.parse() {
        Ok(id) => id,
        Err(_) => return plain_response(400, "Invalid conversation ID"),
    };

    let user = match state.sessions.validate(&params.token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!("WebSocket auth failed: {}", e);
            return plain_response(401, "Authentication failed");
        }
    };

    let conversation = match state.conversations.find_by_id(conversation_id).await {
        Ok(Some(conversation)) => conversation,
        Ok(None) => return plain_response(404, "Conversation not found"),
        Err(e) => {
            tracing::error!("Failed to load conversation for upgrade: {}", e);
            return plain_response(500, "Internal error");
        }
    };

    if !conversation.is_participant(&user.id) {
        return plain_response(403, "Not a participant");
    }

    ws.on_upgrade(move |socket| handle_socket(socket, conversation_id, user.id, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection: joins the conversation room,
/// forwards room broadcasts, processes client messages (ping, mark_read,
/// typing), and cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    conversation_id: ConversationId,
    user_id: UserId,
    state: WebSocketState,
) {
    let (mut sender, mut receiver) = socket.split();

    let client_id = ClientId::new();

    let mut room_rx: broadcast::Receiver<ConversationEvent> = state
        .room_manager
        .join(&conversation_id, client_id.clone())
        .await;

    // Connection-local replies (pong, errors) bypass the room.
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMessage>(8);

    let connected = ServerMessage::Connected(ConnectedMessage {
        conversation_id: conversation_id.to_string(),
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });

    if let Err(e) = send_message(&mut sender, &connected).await {
        tracing::debug!("Failed to send connected message: {}", e);
        state.room_manager.leave(&client_id).await;
        return; // Client disconnected immediately
    }

    // Forward room broadcasts and direct replies to the client.
    let mut send_task = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    event = room_rx.recv() => match event {
                        Ok(event) => event.to_server_message(),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Slow client; it recovers on its next fetch.
                            tracing::debug!(client_id = %client_id, skipped, "room events lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    direct = direct_rx.recv() => match direct {
                        Some(msg) => msg,
                        None => break,
                    },
                };

                if let Err(e) = send_message(&mut sender, &msg).await {
                    tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
                    break;
                }
            }
        })
    };

    // Handle incoming messages from the client.
    let room_manager = state.room_manager.clone();
    let message_service = state.message_service.clone();
    let recv_user = user_id.clone();
    let recv_client = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
                        tracing::debug!(client_id = %recv_client, "Unparseable client message");
                        continue;
                    };
                    match client_msg {
                        ClientMessage::Ping => {
                            let _ = direct_tx
                                .send(ServerMessage::Pong(PongMessage {
                                    timestamp: Timestamp::now().to_rfc3339(),
                                }))
                                .await;
                        }
                        ClientMessage::MarkRead => {
                            // Same idempotent operation as the HTTP read
                            // endpoint; the receipt broadcast rides on the
                            // notifier inside the service.
                            if let Err(e) =
                                message_service.mark_read(conversation_id, &recv_user).await
                            {
                                let _ = direct_tx
                                    .send(ServerMessage::Error(ErrorMessage {
                                        code: e.code().to_string(),
                                        message: e.to_string(),
                                        timestamp: Timestamp::now().to_rfc3339(),
                                    }))
                                    .await;
                            }
                        }
                        ClientMessage::TypingStart => {
                            broadcast_typing(
                                &room_manager,
                                conversation_id,
                                &recv_user,
                                ConversationEventKind::TypingStarted,
                            )
                            .await;
                        }
                        ClientMessage::TypingStop => {
                            broadcast_typing(
                                &room_manager,
                                conversation_id,
                                &recv_user,
                                ConversationEventKind::TypingStopped,
                            )
                            .await;
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(client_id = %recv_client, "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level frames are handled by axum.
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(client_id = %recv_client, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(client_id = %recv_client, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Whichever task finishes first tears down the other.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.room_manager.leave(&client_id).await;
}

/// Typing indicators are transient: broadcast-only, never persisted.
async fn broadcast_typing(
    room_manager: &RoomManager,
    conversation_id: ConversationId,
    user: &UserId,
    kind: ConversationEventKind,
) {
    let payload = serde_json::json!({ "userId": user.to_string() });
    room_manager
        .broadcast(
            &conversation_id,
            ConversationEvent::new(kind, conversation_id, payload),
        )
        .await;
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).expect("ServerMessage serialization should not fail");
    sender.send(Message::Text(json.into())).await
}

fn plain_response(status: u16, body: &'static str) -> Response {
    Response::builder()
        .status(status)
        .body(body.into())
        .expect("static response should build")
}

/// Create axum router for the WebSocket endpoint.
pub fn live_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/conversations/{conversation_id}/live", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMarketplace;
    use crate::ports::{ConversationNotifier, NullNotifier};

    struct DummyValidator;

    #[async_trait::async_trait]
    impl SessionValidator for DummyValidator {
        async fn validate(
            &self,
            _token: &str,
        ) -> Result<crate::domain::foundation::AuthenticatedUser, crate::domain::foundation::AuthError>
        {
            Ok(crate::domain::foundation::AuthenticatedUser::new(
                UserId::new("user-1").unwrap(),
                None,
            ))
        }
    }

    fn make_state() -> WebSocketState {
        let store = Arc::new(InMemoryMarketplace::new());
        let notifier: Arc<dyn ConversationNotifier> = Arc::new(NullNotifier);
        let message_service = MessageService::new(store.clone(), store.clone(), notifier);
        WebSocketState::new(
            Arc::new(RoomManager::default()),
            Arc::new(DummyValidator),
            store,
            message_service,
        )
    }

    #[test]
    fn websocket_state_creates_successfully() {
        let state = make_state();
        assert_eq!(Arc::strong_count(&state.room_manager), 1);
    }

    #[test]
    fn live_router_creates_route() {
        let _router = live_router();
    }

    #[test]
    fn live_params_deserialize_token() {
        let params: LiveParams = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(params.token, "abc");
    }
}
