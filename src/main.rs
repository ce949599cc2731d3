//! Bookbarter server entrypoint.
//!
//! Bootstrap order: configuration, tracing, PostgreSQL pool (+ optional
//! migrations), Redis-backed rate limiter (in-memory fallback), service
//! wiring, router, serve.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookbarter::adapters::auth::TrustedTokenValidator;
use bookbarter::adapters::http::{api_router, AppState};
use bookbarter::adapters::postgres::{
    PostgresConversationStore, PostgresListingReader, PostgresMessageStore, PostgresReviewStore,
};
use bookbarter::adapters::rate_limiter::{
    InMemoryRateLimiter, RateLimitConfig, RedisRateLimiter,
};
use bookbarter::adapters::websocket::{RoomManager, RoomNotifier, WebSocketState};
use bookbarter::application::{ConversationService, MessageService, ReviewService};
use bookbarter::config::AppConfig;
use bookbarter::ports::{
    ConversationNotifier, ConversationStore, ListingReader, MessageStore, RateLimiter, ReviewStore,
    SessionValidator,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Stores
    let conversations: Arc<dyn ConversationStore> =
        Arc::new(PostgresConversationStore::new(pool.clone()));
    let messages: Arc<dyn MessageStore> = Arc::new(PostgresMessageStore::new(pool.clone()));
    let reviews: Arc<dyn ReviewStore> = Arc::new(PostgresReviewStore::new(pool.clone()));
    let listings: Arc<dyn ListingReader> = Arc::new(PostgresListingReader::new(pool));

    // Realtime
    let room_manager = Arc::new(RoomManager::new(config.realtime.room_channel_capacity));
    let notifier: Arc<dyn ConversationNotifier> = Arc::new(RoomNotifier::new(room_manager.clone()));

    // Services
    let conversation_service = ConversationService::new(
        conversations.clone(),
        messages.clone(),
        reviews.clone(),
        listings,
    );
    let message_service = MessageService::new(conversations.clone(), messages, notifier);
    let review_service = ReviewService::new(conversations.clone(), reviews);

    // Rate limiting: Redis in production, in-memory when Redis is down.
    let rate_limiter = build_rate_limiter(&config).await;

    let sessions: Arc<dyn SessionValidator> = Arc::new(TrustedTokenValidator);

    let app_state = AppState::new(
        conversation_service,
        message_service.clone(),
        review_service,
    )
    .with_rate_limiter(rate_limiter);

    let ws_state = WebSocketState::new(
        room_manager,
        sessions.clone(),
        conversations,
        message_service,
    );

    let app = api_router(app_state, ws_state, sessions)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Bookbarter listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_rate_limiter(config: &AppConfig) -> Arc<dyn RateLimiter> {
    match redis::Client::open(config.redis.url.as_str()) {
        Ok(client) => match client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                tracing::info!("Rate limiting backed by Redis");
                return Arc::new(RedisRateLimiter::new(conn, RateLimitConfig::default()));
            }
            Err(e) => {
                tracing::warn!("Redis unavailable ({}), using in-memory rate limiter", e);
            }
        },
        Err(e) => {
            tracing::warn!("Invalid Redis configuration ({}), using in-memory rate limiter", e);
        }
    }
    Arc::new(InMemoryRateLimiter::with_defaults())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        // Development default; production sets explicit origins.
        CorsLayer::permissive()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}
