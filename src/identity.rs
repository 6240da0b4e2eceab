use async_trait::async_trait;

use crate::errors::PlayerError;
use crate::PlayerId;

/// Turns a bearer token into the id of the player it belongs to.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<PlayerId, PlayerError>;
}

/// Development verifier: the token itself is the player id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevIdentityVerifier;

#[async_trait]
impl IdentityVerifier for DevIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<PlayerId, PlayerError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PlayerError::AuthenticationFailed {
                details: "empty token".to_string(),
            });
        }
        Ok(token.to_string())
    }
}

/// Bearer token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
