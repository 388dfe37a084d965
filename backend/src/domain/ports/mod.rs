//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod asset_host;
mod auth_service;
mod issue_command;
mod issue_query;
mod issue_repository;
mod password_hasher;
mod token_codec;
mod user_repository;

#[cfg(test)]
pub use asset_host::MockAssetHost;
pub use asset_host::{AssetHost, AssetHostError, StoredAsset};
pub use auth_service::AuthService;
#[cfg(test)]
pub use auth_service::MockAuthService;
pub use issue_command::IssueCommand;
#[cfg(test)]
pub use issue_command::MockIssueCommand;
pub use issue_query::IssueQuery;
#[cfg(test)]
pub use issue_query::MockIssueQuery;
#[cfg(test)]
pub use issue_repository::MockIssueRepository;
pub use issue_repository::{IssuePersistenceError, IssueRepository};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenCodecError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};

#[cfg(test)]
mod tests;
