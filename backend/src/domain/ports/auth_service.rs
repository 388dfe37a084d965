//! Driving port for account and bearer token use-cases.
//!
//! Inbound adapters call it to register, sign in and resolve bearer tokens
//! without importing the hashing, signing or storage adapters behind it.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LoginCredentials, Registration, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and sign a token for it.
    async fn register(&self, registration: &Registration) -> Result<AuthSession, Error>;

    /// Check credentials and sign a token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error>;

    /// Resolve a bearer token to the user it was issued for.
    async fn authenticate(&self, token: &str) -> Result<User, Error>;

    /// Load a user's public profile.
    async fn current_user(&self, id: &UserId) -> Result<User, Error>;
}
