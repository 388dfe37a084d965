//! Bearer token signing secret configuration.
//!
//! The secret is read from the environment rather than the layered settings
//! file so it never lands in config dumps. Release builds require an explicit
//! secret; debug builds fall back to an ephemeral one.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroizing;

pub const SECRET_FILE_ENV: &str = "VOICEIT_JWT_SECRET_FILE";
pub const SECRET_ENV: &str = "VOICEIT_JWT_SECRET";
/// Minimum secret length accepted in release builds.
pub const SECRET_MIN_LEN: usize = 32;

const FINGERPRINT_BYTES: usize = 8;
const EPHEMERAL_SECRET_LEN: usize = 64;

/// Build mode for secret validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate a missing secret and warn.
    Debug,
    /// Release builds require an explicit secret of sufficient length.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use voiceit::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated signing secret.
pub struct TokenSettings {
    /// HMAC secret, wiped on drop.
    pub secret: Zeroizing<Vec<u8>>,
    /// Truncated SHA-256 of the secret for logs.
    pub fingerprint: String,
    /// Whether the secret was generated for this process only.
    pub ephemeral: bool,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("fingerprint", &self.fingerprint)
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}

/// Errors raised while loading the signing secret.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// No secret was configured.
    #[error("missing required environment variable: {SECRET_FILE_ENV} or {SECRET_ENV}")]
    MissingEnv,
    /// Reading the secret file failed.
    #[error("failed to read token secret at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret is too short for release builds.
    #[error("token secret too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort { length: usize, min_len: usize },
}

/// Truncated SHA-256 fingerprint of a secret, hex encoded.
///
/// # Examples
///
/// ```rust
/// use voiceit::inbound::http::token_config::secret_fingerprint;
///
/// let fp = secret_fingerprint(b"secret");
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
    rand::thread_rng().fill_bytes(secret.as_mut_slice());
    secret
}

fn read_secret<E: Env>(env: &E) -> Result<Option<Zeroizing<Vec<u8>>>, TokenConfigError> {
    if let Some(path) = env.string(SECRET_FILE_ENV).filter(|path| !path.trim().is_empty()) {
        let path = PathBuf::from(path);
        return std::fs::read(&path)
            .map(|bytes| Some(Zeroizing::new(bytes)))
            .map_err(|source| TokenConfigError::KeyRead { path, source });
    }
    Ok(env
        .string(SECRET_ENV)
        .filter(|value| !value.is_empty())
        .map(|value| {
            let value = Zeroizing::new(value);
            Zeroizing::new(value.as_bytes().to_vec())
        }))
}

/// Load the signing secret from the environment.
///
/// `VOICEIT_JWT_SECRET_FILE` wins over `VOICEIT_JWT_SECRET`. Debug builds
/// accept short secrets with a warning and generate an ephemeral secret when
/// none is configured; tokens then stop validating after a restart.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use voiceit::inbound::http::token_config::{BuildMode, token_settings_from_env};
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "VOICEIT_JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_owned()),
///     _ => None,
/// });
/// let settings = token_settings_from_env(&env, BuildMode::Release).unwrap();
/// assert_eq!(settings.secret.len(), 32);
/// ```
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let (secret, ephemeral) = match read_secret(env)? {
        Some(secret) => (secret, false),
        None if mode.is_debug() => {
            warn!("no token secret configured; using an ephemeral secret (dev only)");
            (ephemeral_secret(), true)
        }
        None => return Err(TokenConfigError::MissingEnv),
    };

    if secret.len() < SECRET_MIN_LEN {
        if mode.is_debug() {
            warn!(
                length = secret.len(),
                min_len = SECRET_MIN_LEN,
                "token secret shorter than recommended (dev only)"
            );
        } else {
            return Err(TokenConfigError::KeyTooShort {
                length: secret.len(),
                min_len: SECRET_MIN_LEN,
            });
        }
    }

    let fingerprint = secret_fingerprint(&secret);
    Ok(TokenSettings {
        secret,
        fingerprint,
        ephemeral,
    })
}
