//! Gateway-trust token validator.
//!
//! The platform terminates real authentication (OIDC, sessions) at its edge
//! and forwards this service an opaque token of the form `user:<id>` or
//! `user:<id>:<display name>`. This validator only unpacks that shape; it is
//! also what development and test environments use directly.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Validates gateway-issued opaque tokens.
pub struct TrustedTokenValidator;

#[async_trait]
impl SessionValidator for TrustedTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let rest = token.strip_prefix("user:").ok_or(AuthError::InvalidToken)?;

        let (id, display_name) = match rest.split_once(':') {
            Some((id, name)) if !name.is_empty() => (id, Some(name.to_string())),
            Some((id, _)) => (id, None),
            None => (rest, None),
        };

        let id = UserId::new(id).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(id, display_name))
    }
}
