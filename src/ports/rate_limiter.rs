//! Rate limiting port for throttling message sends.
//!
//! Uses a fixed-window counter. Implementations can use in-memory storage
//! for testing/single-node deployments or Redis for production.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::UserId;

/// Port for rate limiting operations.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if the request is allowed, consuming one unit of quota if so.
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitDecision, RateLimitError>;
}

/// Key identifying what to rate limit: one user on one resource.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub user: UserId,
    pub resource: &'static str,
}

impl RateLimitKey {
    /// Creates a per-user key for a named resource.
    pub fn user_resource(user: &UserId, resource: &'static str) -> Self {
        Self {
            user: user.clone(),
            resource,
        }
    }

    /// Returns the backing-store key string.
    pub fn storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.resource, self.user)
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.user)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request allowed; `remaining` units left in the window.
    Allowed { remaining: u32 },
    /// Request denied; retry after the given number of seconds.
    Denied { retry_after_secs: u64 },
}

impl RateLimitDecision {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The backing store could not be reached.
    #[error("Rate limiter unavailable: {0}")]
    Unavailable(String),
}
