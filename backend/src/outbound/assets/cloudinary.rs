//! Reqwest-backed Cloudinary asset host.
//!
//! This adapter owns transport details only: request signing, multipart
//! encoding, HTTP error mapping and JSON decoding of the upload response.
//! Requests are signed with SHA-256 over the sorted, `&`-joined parameters
//! followed by the API secret.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ImageUpload;
use crate::domain::ports::{AssetHost, AssetHostError, StoredAsset};

/// Default REST endpoint; the cloud name and resource path are appended.
pub const DEFAULT_CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1/";
/// Folder every issue photo is filed under.
pub const DEFAULT_CLOUDINARY_FOLDER: &str = "voiceit/issues";
/// Incoming transformation: fit within 1200x800, automatic quality, JPEG.
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_800,w_1200/q_auto/f_jpg";

/// Account credentials and placement settings.
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub folder: String,
}

/// Cloudinary adapter performing signed uploads and deletions.
pub struct CloudinaryAssetHost {
    client: Client,
    upload_endpoint: Url,
    destroy_endpoint: Url,
    api_key: String,
    api_secret: Zeroizing<String>,
    folder: String,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryAssetHost {
    /// Build an adapter against `api_base` with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AssetHostError::Transport`] when the endpoints cannot be
    /// derived or the reqwest client cannot be constructed.
    pub fn new(
        api_base: &Url,
        credentials: CloudinaryCredentials,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssetHostError> {
        let endpoint = |action: &str| {
            api_base
                .join(&format!("{}/image/{action}", credentials.cloud_name))
                .map_err(|err| AssetHostError::transport(format!("invalid endpoint: {err}")))
        };
        let upload_endpoint = endpoint("upload")?;
        let destroy_endpoint = endpoint("destroy")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AssetHostError::transport(err.to_string()))?;
        Ok(Self {
            client,
            upload_endpoint,
            destroy_endpoint,
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
            folder: credentials.folder,
            clock,
        })
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, self.api_secret.as_str())
    }
}

/// Signed parameters of an upload request, also sent as form fields.
fn upload_params<'a>(folder: &'a str, timestamp: &'a str) -> [(&'static str, &'a str); 3] {
    [
        ("folder", folder),
        ("timestamp", timestamp),
        ("transformation", UPLOAD_TRANSFORMATION),
    ]
}

/// Hex SHA-256 of `k1=v1&k2=v2...` (keys sorted) followed by `secret`.
fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(key, _)| *key);
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Public id of a delivery URL: the path after `/upload/`, minus an optional
/// `v<digits>` version segment and the file extension.
fn public_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let (_, after) = parsed.path().split_once("/upload/")?;
    let after = match after.split_once('/') {
        Some((version, rest))
            if version.len() > 1
                && version.starts_with('v')
                && version[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => after,
    };
    let id = match after.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => after,
    };
    (!id.is_empty()).then(|| id.to_owned())
}

#[async_trait]
impl AssetHost for CloudinaryAssetHost {
    async fn store(&self, image: &ImageUpload) -> Result<StoredAsset, AssetHostError> {
        let timestamp = self.clock.utc().timestamp().to_string();
        let params = upload_params(&self.folder, &timestamp);
        let signature = self.sign(&params);
        let file = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().unwrap_or("upload").to_owned())
            .mime_str(image.content_type())
            .map_err(|err| AssetHostError::transport(format!("invalid content type: {err}")))?;
        let form = params
            .into_iter()
            .fold(Form::new().part("file", file), |form, (key, value)| {
                form.text(key, value.to_owned())
            })
            .text("api_key", self.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let decoded: UploadResponse = serde_json::from_slice(&body).map_err(|error| {
            AssetHostError::invalid_response(format!("invalid upload payload: {error}"))
        })?;
        debug!(url = %decoded.secure_url, bytes = image.bytes().len(), "image stored");
        Ok(StoredAsset {
            url: decoded.secure_url,
        })
    }

    async fn remove(&self, url: &str) -> Result<(), AssetHostError> {
        let id = public_id(url).ok_or_else(|| {
            AssetHostError::invalid_response(format!("cannot derive public id from {url}"))
        })?;
        let timestamp = self.clock.utc().timestamp().to_string();
        let signature = self.sign(&[("public_id", id.as_str()), ("timestamp", timestamp.as_str())]);

        let response = self
            .client
            .post(self.destroy_endpoint.clone())
            .form(&[
                ("public_id", id.as_str()),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let decoded: DestroyResponse = serde_json::from_slice(&body).map_err(|error| {
            AssetHostError::invalid_response(format!("invalid destroy payload: {error}"))
        })?;
        match decoded.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AssetHostError::invalid_response(format!(
                "unexpected destroy result '{other}'"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

fn map_transport_error(error: reqwest::Error) -> AssetHostError {
    if error.is_timeout() {
        AssetHostError::timeout(error.to_string())
    } else {
        AssetHostError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AssetHostError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AssetHostError::timeout(format!("status {}", status.as_u16()))
        }
        _ => AssetHostError::rejected(status.as_u16(), preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
