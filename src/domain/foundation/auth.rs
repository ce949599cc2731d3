//! Authentication types for the domain layer.
//!
//! These types represent an authenticated user resolved from a bearer token.
//! They have **no external dependencies** - any identity provider can populate
//! them via the `SessionValidator` port.

use super::UserId;
use thiserror::Error;

/// Authenticated user resolved from a validated token.
///
/// This is a **domain type** with no provider dependencies.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// Display name if available.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, display_name: Option<String>) -> Self {
        Self { id, display_name }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token is malformed or its signature is invalid.
    #[error("Invalid token")]
    InvalidToken,

    /// The identity provider could not be reached.
    #[error("Authentication service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_user_carries_identity() {
        let user = AuthenticatedUser::new(
            UserId::new("user-1").unwrap(),
            Some("Alice".to_string()),
        );
        assert_eq!(user.id.as_str(), "user-1");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn auth_error_displays_correctly() {
        assert_eq!(format!("{}", AuthError::TokenExpired), "Token expired");
        assert_eq!(format!("{}", AuthError::InvalidToken), "Invalid token");
    }
}
