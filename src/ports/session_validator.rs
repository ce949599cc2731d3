//! Session validation port.
//!
//! Token issuance is the identity provider's job; this port only turns an
//! opaque bearer token into an [`AuthenticatedUser`]. The HTTP middleware
//! and the WebSocket upgrade handler both consume it.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer tokens into authenticated users.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validates a token, returning the authenticated user.
    ///
    /// # Errors
    ///
    /// - `TokenExpired` / `InvalidToken` for bad tokens
    /// - `ServiceUnavailable` if the identity provider cannot be reached
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
