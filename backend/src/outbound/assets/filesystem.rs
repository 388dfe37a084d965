//! Local-disk asset host for single-node deployments.
//!
//! Photos are written into one capability-scoped directory, so a crafted file
//! name can never escape it. Stored files are served back by the HTTP adapter
//! under the configured public base URL.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::domain::ImageUpload;
use crate::domain::ports::{AssetHost, AssetHostError, StoredAsset};

/// File extension used for a stored photo of the given MIME type.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/heic" => "heic",
        _ => "img",
    }
}

/// MIME type served for a stored file name.
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Accept only names this host could have generated: one path segment of
/// ASCII alphanumerics, dashes and a single extension dot.
fn is_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.matches('.').count() <= 1
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

fn storage_error(error: std::io::Error) -> AssetHostError {
    AssetHostError::storage(error.to_string())
}

fn task_error(error: tokio::task::JoinError) -> AssetHostError {
    AssetHostError::storage(format!("storage task aborted: {error}"))
}

/// Asset host writing photos to a local directory.
#[derive(Clone)]
pub struct FilesystemAssetHost {
    dir: Arc<Dir>,
    public_base: Url,
}

impl FilesystemAssetHost {
    /// Open (creating if needed) `root` and serve files under `public_base`.
    ///
    /// A trailing slash is added to `public_base` when missing.
    ///
    /// # Errors
    ///
    /// Returns [`AssetHostError::Storage`] when the directory cannot be created
    /// or opened.
    pub fn open(root: &Path, mut public_base: Url) -> Result<Self, AssetHostError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(storage_error)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(storage_error)?;
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Ok(Self {
            dir: Arc::new(dir),
            public_base,
        })
    }

    fn name_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base.as_str())
            .filter(|name| is_stored_name(name))
    }

    /// Read a stored photo by file name. Returns `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`AssetHostError::Storage`] when the file exists but cannot be
    /// read.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, AssetHostError> {
        if !is_stored_name(name) {
            return Ok(None);
        }
        let dir = Arc::clone(&self.dir);
        let name = name.to_owned();
        let outcome = tokio::task::spawn_blocking(move || dir.read(&name))
            .await
            .map_err(task_error)?;
        match outcome {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(storage_error(error)),
        }
    }
}

#[async_trait]
impl AssetHost for FilesystemAssetHost {
    async fn store(&self, image: &ImageUpload) -> Result<StoredAsset, AssetHostError> {
        let name = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_for(image.content_type())
        );
        let url = self
            .public_base
            .join(&name)
            .map_err(|err| AssetHostError::storage(format!("invalid public url: {err}")))?;
        let dir = Arc::clone(&self.dir);
        let bytes = image.bytes().to_vec();
        let target = name.clone();
        tokio::task::spawn_blocking(move || dir.write(&target, bytes))
            .await
            .map_err(task_error)?
            .map_err(storage_error)?;
        debug!(%name, "image written to local storage");
        Ok(StoredAsset { url: url.into() })
    }

    async fn remove(&self, url: &str) -> Result<(), AssetHostError> {
        let Some(name) = self.name_from_url(url) else {
            return Err(AssetHostError::invalid_response(format!(
                "{url} is not served by this host"
            )));
        };
        let dir = Arc::clone(&self.dir);
        let name = name.to_owned();
        let outcome = tokio::task::spawn_blocking(move || dir.remove_file(&name))
            .await
            .map_err(task_error)?;
        match outcome {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(storage_error(error)),
        }
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
