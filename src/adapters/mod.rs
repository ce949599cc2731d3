//! Adapters - concrete implementations of the ports.

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod rate_limiter;
pub mod websocket;
