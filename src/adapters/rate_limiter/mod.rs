//! Rate limiter adapters - fixed-window counters over memory or Redis.

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;

/// Fixed-window rate limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub requests_per_window: u32,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Message sends: generous for humans, tight for scripts.
        Self {
            requests_per_window: 30,
            window_secs: 60,
        }
    }
}
