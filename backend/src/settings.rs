//! Application settings loaded via OrthoConfig.
//!
//! Every field maps to a `VOICEIT_*` environment variable (and the matching
//! CLI flag or config file key). The token signing secret and the Cloudinary
//! API secret are not settings; the server reads them from the environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    DEFAULT_TOKEN_TTL_DAYS, DEFAULT_UPLOAD_TIMEOUT, FieldErrors, Registration, StatusUpdatePolicy,
    UnknownVariant,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BCRYPT_COST: u32 = 12;
const DEFAULT_ADMIN_NAME: &str = "Administrator";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Which photo host the server wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetHostKind {
    Cloudinary,
    Filesystem,
}

impl AssetHostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloudinary => "cloudinary",
            Self::Filesystem => "filesystem",
        }
    }
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind host '{host}'")]
    InvalidHost { host: String },
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("invalid public base url '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("token ttl must be between 1 and 3650 days, got {days}")]
    InvalidTokenTtl { days: i64 },
    #[error("administrator account is invalid: {0}")]
    InvalidAdmin(#[from] FieldErrors),
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
}

/// Server configuration values.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VOICEIT")]
pub struct AppSettings {
    /// Interface to bind.
    pub host: Option<String>,
    /// TCP port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Expose internal error details in responses.
    #[ortho_config(default = false)]
    pub dev_mode: bool,
    /// Bearer token lifetime in days.
    pub token_ttl_days: Option<i64>,
    /// bcrypt work factor.
    pub bcrypt_cost: Option<u32>,
    /// Administrator created at startup when both email and password are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
    /// Let registrations using `admin_email` receive the admin role.
    #[ortho_config(default = false)]
    pub admin_email_grants_role: bool,
    /// `any-authenticated` or `admin-only`.
    pub status_policy: Option<String>,
    /// `cloudinary` or `filesystem`.
    pub asset_host: Option<String>,
    /// Directory used by the filesystem asset host.
    pub upload_dir: Option<PathBuf>,
    /// Base URL under which filesystem uploads are served.
    pub public_base_url: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_base: Option<String>,
    pub cloudinary_folder: Option<String>,
    /// Deadline for all photo uploads of one submission.
    pub upload_timeout_secs: Option<u64>,
    /// Insert demonstration issues into an empty store.
    #[ortho_config(default = false)]
    pub seed_sample_issues: bool,
    pub db_pool_max_size: Option<u32>,
}

impl AppSettings {
    /// Socket address to bind, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let ip: IpAddr = host.parse().map_err(|_| SettingsError::InvalidHost {
            host: host.to_owned(),
        })?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT)))
    }

    pub fn token_ttl(&self) -> Result<TimeDelta, SettingsError> {
        let days = self.token_ttl_days.unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        if !(1..=3650).contains(&days) {
            return Err(SettingsError::InvalidTokenTtl { days });
        }
        Ok(TimeDelta::days(days))
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }

    /// Startup administrator, when both email and password are configured.
    pub fn admin_registration(&self) -> Result<Option<Registration>, SettingsError> {
        let (Some(email), Some(password)) = (&self.admin_email, &self.admin_password) else {
            return Ok(None);
        };
        let name = self.admin_name.as_deref().unwrap_or(DEFAULT_ADMIN_NAME);
        Ok(Some(Registration::try_from_parts(name, email, password)?))
    }

    pub fn status_policy(&self) -> Result<StatusUpdatePolicy, SettingsError> {
        match self.status_policy.as_deref() {
            Some(value) => Ok(value.parse()?),
            None => Ok(StatusUpdatePolicy::default()),
        }
    }

    /// Configured photo host, defaulting to the local filesystem.
    pub fn asset_host(&self) -> Result<AssetHostKind, SettingsError> {
        match self.asset_host.as_deref() {
            None | Some("filesystem") => Ok(AssetHostKind::Filesystem),
            Some("cloudinary") => Ok(AssetHostKind::Cloudinary),
            Some(other) => Err(UnknownVariant {
                kind: "asset host",
                value: other.to_owned(),
            }
            .into()),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    /// Base URL for filesystem uploads, defaulting to the bound port on localhost.
    pub fn public_base_url(&self) -> Result<Url, SettingsError> {
        let value = self.public_base_url.clone().unwrap_or_else(|| {
            format!(
                "http://localhost:{}/uploads/",
                self.port.unwrap_or(DEFAULT_PORT)
            )
        });
        Url::parse(&value).map_err(|source| SettingsError::InvalidUrl { value, source })
    }

    pub fn cloudinary_cloud_name(&self) -> Result<&str, SettingsError> {
        self.cloudinary_cloud_name
            .as_deref()
            .ok_or(SettingsError::Missing {
                key: "VOICEIT_CLOUDINARY_CLOUD_NAME",
            })
    }

    pub fn cloudinary_api_key(&self) -> Result<&str, SettingsError> {
        self.cloudinary_api_key
            .as_deref()
            .ok_or(SettingsError::Missing {
                key: "VOICEIT_CLOUDINARY_API_KEY",
            })
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout_secs
            .map_or(DEFAULT_UPLOAD_TIMEOUT, Duration::from_secs)
    }

    pub fn db_pool_max_size(&self) -> u32 {
        self.db_pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }
}
