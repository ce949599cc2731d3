//! Redis-backed rate limiter implementation for production deployments.
//!
//! Uses a simple fixed-window counter algorithm with Redis INCR + EXPIRE.
//! Suitable for multi-server deployments.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::RateLimitConfig;

/// Redis-backed rate limiter for production multi-server deployments.
///
/// Fixed-window counter:
/// 1. INCR the key
/// 2. If the count is 1, EXPIRE it for the window duration
/// 3. If the count exceeds the limit, deny the request
///
/// Requests at window boundaries can briefly exceed the limit; acceptable
/// for message-send throttling.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    /// Create a new Redis rate limiter.
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        let storage_key = key.storage_key();
        let limit = self.config.requests_per_window;
        let window_secs = self.config.window_secs;

        let mut conn = self.conn.clone();

        // Atomic increment
        let count: i64 = conn
            .incr(&storage_key, 1_i64)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

        // Set expiry on first request in window
        if count == 1 {
            conn.expire::<_, ()>(&storage_key, window_secs as i64)
                .await
                .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;
        }

        if count as u32 > limit {
            let ttl: i64 = conn
                .ttl(&storage_key)
                .await
                .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

            let retry_after_secs = if ttl > 0 { ttl as u64 } else { window_secs };
            return Ok(RateLimitDecision::Denied { retry_after_secs });
        }

        Ok(RateLimitDecision::Allowed {
            remaining: limit.saturating_sub(count as u32),
        })
    }
}
