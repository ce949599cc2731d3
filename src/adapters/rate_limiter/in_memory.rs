//! In-memory rate limiter implementation for testing and development.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.
//! Not suitable for multi-server deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitDecision, RateLimitError, RateLimitKey, RateLimiter};

use super::RateLimitConfig;

/// In-memory rate limiter for testing and single-server deployments.
///
/// Each key tracks the request count of its current window; the count
/// resets when the window expires.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: RwLock<HashMap<String, WindowState>>,
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: u64,
}

impl InMemoryRateLimiter {
    /// Create a new in-memory rate limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Create a rate limiter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    fn now_secs() -> u64 {
        Timestamp::now().as_unix_secs()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError> {
        let storage_key = key.storage_key();
        let now = Self::now_secs();
        let limit = self.config.requests_per_window;
        let window_secs = self.config.window_secs;

        let mut windows = self.windows.write().await;
        let state = windows.entry(storage_key).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        // Reset an expired window.
        if now >= state.window_start + window_secs {
            state.count = 0;
            state.window_start = now;
        }

        if state.count >= limit {
            let retry_after_secs = (state.window_start + window_secs).saturating_sub(now).max(1);
            return Ok(RateLimitDecision::Denied { retry_after_secs });
        }

        state.count += 1;
        Ok(RateLimitDecision::Allowed {
            remaining: limit - state.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn key() -> RateLimitKey {
        RateLimitKey::user_resource(&UserId::new("user-1").unwrap(), "send_message")
    }

    #[tokio::test]
    async fn allows_up_to_the_limit() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            requests_per_window: 3,
            window_secs: 60,
        });

        for _ in 0..3 {
            assert!(limiter.check(&key()).await.unwrap().is_allowed());
        }
        let denied = limiter.check(&key()).await.unwrap();
        assert!(!denied.is_allowed());
    }

    #[tokio::test]
    async fn remaining_counts_down() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            requests_per_window: 2,
            window_secs: 60,
        });

        match limiter.check(&key()).await.unwrap() {
            RateLimitDecision::Allowed { remaining } => assert_eq!(remaining, 1),
            other => panic!("expected allowed, got {:?}", other),
        }
        match limiter.check(&key()).await.unwrap() {
            RateLimitDecision::Allowed { remaining } => assert_eq!(remaining, 0),
            other => panic!("expected allowed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn separate_users_have_separate_windows() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            requests_per_window: 1,
            window_secs: 60,
        });

        assert!(limiter.check(&key()).await.unwrap().is_allowed());
        assert!(!limiter.check(&key()).await.unwrap().is_allowed());

        let other = RateLimitKey::user_resource(&UserId::new("user-2").unwrap(), "send_message");
        assert!(limiter.check(&other).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn denial_reports_retry_after() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            requests_per_window: 1,
            window_secs: 60,
        });

        limiter.check(&key()).await.unwrap();
        match limiter.check(&key()).await.unwrap() {
            RateLimitDecision::Denied { retry_after_secs } => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            other => panic!("expected denied, got {:?}", other),
        }
    }
}
