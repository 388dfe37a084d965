//! Port for signing and verifying bearer tokens.

use crate::domain::{AccessToken, TokenClaims};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codecs.
    pub enum TokenCodecError {
        /// The token is malformed, has a bad signature or carries bad claims.
        Invalid { message: String } => "invalid token: {message}",
        /// Signing failed.
        Encoding { message: String } => "token encoding failed: {message}",
    }
}

/// Signs claims into an opaque token and verifies tokens back into claims.
///
/// Expiry is not checked here; callers compare
/// [`TokenClaims::expires_at`] against their own clock.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign claims.
    fn encode(&self, claims: &TokenClaims) -> Result<AccessToken, TokenCodecError>;

    /// Verify a token's signature and decode its claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenCodecError>;
}
