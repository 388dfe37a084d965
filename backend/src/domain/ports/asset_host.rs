//! Port for the external image host that stores issue photos.

use async_trait::async_trait;

use crate::domain::ImageUpload;

use super::define_port_error;

define_port_error! {
    /// Errors raised by asset host adapters.
    pub enum AssetHostError {
        /// The host could not be reached.
        Transport { message: String } => "asset host transport failed: {message}",
        /// The host did not answer in time.
        Timeout { message: String } => "asset host timed out: {message}",
        /// The host answered but refused the request.
        Rejected { status: u16, message: String } =>
            "asset host rejected request with status {status}: {message}",
        /// The host answered with a payload we could not understand.
        InvalidResponse { message: String } => "asset host returned an invalid response: {message}",
        /// Local storage failed.
        Storage { message: String } => "asset storage failed: {message}",
    }
}

/// Location of a stored photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Public URL clients use to fetch the photo.
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Upload one photo and return its public URL.
    async fn store(&self, image: &ImageUpload) -> Result<StoredAsset, AssetHostError>;

    /// Delete a previously stored photo by its public URL.
    async fn remove(&self, url: &str) -> Result<(), AssetHostError>;

    /// Short name reported by health checks.
    fn name(&self) -> &'static str;
}
