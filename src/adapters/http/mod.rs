//! HTTP adapter - axum routes, handlers, and middleware.

pub mod conversation;
pub mod error;
pub mod middleware;
pub mod review;

pub use error::{ApiError, ErrorBody};

use std::sync::Arc;

use axum::Router;

use crate::application::{ConversationService, MessageService, ReviewService};
use crate::ports::RateLimiter;

use self::middleware::{auth_middleware, AuthState};
use super::websocket::{live_router, WebSocketState};

/// Shared application state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversations: ConversationService,
    pub messages: MessageService,
    pub reviews: ReviewService,
    /// Optional limiter applied to message sends.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl AppState {
    /// Creates the application state.
    pub fn new(
        conversations: ConversationService,
        messages: MessageService,
        reviews: ReviewService,
    ) -> Self {
        Self {
            conversations,
            messages,
            reviews,
            rate_limiter: None,
        }
    }

    /// Attaches a rate limiter for message sends.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }
}

/// Builds the `/api` router: bearer-authenticated REST routes plus the
/// token-in-query WebSocket endpoint.
pub fn api_router(state: AppState, ws_state: WebSocketState, auth: AuthState) -> Router {
    let rest = Router::new()
        .merge(conversation::conversation_routes())
        .merge(review::review_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware));

    // The live endpoint authenticates inside the upgrade handler (browsers
    // cannot set headers on WebSocket requests), so it skips the middleware.
    let live = live_router().with_state(ws_state);

    Router::new().nest("/api", rest.merge(live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::TrustedTokenValidator;
    use crate::adapters::memory::InMemoryMarketplace;
    use crate::adapters::websocket::RoomManager;
    use crate::ports::{ConversationNotifier, NullNotifier};

    fn make_state() -> (AppState, WebSocketState, AuthState) {
        let store = Arc::new(InMemoryMarketplace::new());
        let notifier: Arc<dyn ConversationNotifier> = Arc::new(NullNotifier);

        let conversations = ConversationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let messages = MessageService::new(store.clone(), store.clone(), notifier);
        let reviews = ReviewService::new(store.clone(), store.clone());

        let sessions: AuthState = Arc::new(TrustedTokenValidator);
        let ws_state = WebSocketState::new(
            Arc::new(RoomManager::default()),
            sessions.clone(),
            store,
            messages.clone(),
        );

        (AppState::new(conversations, messages, reviews), ws_state, sessions)
    }

    #[test]
    fn api_router_builds() {
        let (state, ws_state, auth) = make_state();
        let _router = api_router(state, ws_state, auth);
    }

    #[test]
    fn app_state_rate_limiter_is_optional() {
        let (state, _, _) = make_state();
        assert!(state.rate_limiter.is_none());

        let limiter = Arc::new(crate::adapters::rate_limiter::InMemoryRateLimiter::with_defaults());
        let state = state.with_rate_limiter(limiter);
        assert!(state.rate_limiter.is_some());
    }
}
