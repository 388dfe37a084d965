//! bcrypt-backed [`PasswordHasher`].
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool
//! to keep the async workers responsive.
//!
//! bcrypt reads at most 72 input bytes. Passwords are first reduced to the
//! hex form of their SHA-256 digest (64 bytes) so every byte counts.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHasher, PasswordHasherError};

/// Password hasher using bcrypt with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher with an explicit cost, clamped to bcrypt's valid range.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

fn prehash(password: &str) -> Zeroizing<String> {
    Zeroizing::new(hex::encode(Sha256::digest(password.as_bytes())))
}

fn task_failed(error: tokio::task::JoinError) -> PasswordHasherError {
    PasswordHasherError::failed(format!("hashing task aborted: {error}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        let password = prehash(password);
        let cost = self.cost;
        let encoded = tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await
            .map_err(task_failed)?
            .map_err(|err| PasswordHasherError::failed(err.to_string()))?;
        Ok(PasswordHash::new(encoded))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let password = prehash(password);
        let encoded = hash.as_str().to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &encoded))
            .await
            .map_err(task_failed)?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(error) => {
                debug!(%error, "stored password hash could not be parsed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fast() -> BcryptPasswordHasher {
        BcryptPasswordHasher::new(4)
    }

    #[tokio::test]
    async fn hashes_verify_against_their_password_only() {
        let hasher = fast();
        let hash = hasher.hash("secret1").await.expect("hash");

        assert!(hash.as_str().starts_with("$2"));
        assert!(hasher.verify("secret1", &hash).await.expect("verify"));
        assert!(!hasher.verify("secret2", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn hashing_is_salted() {
        let hasher = fast();
        let first = hasher.hash("secret1").await.expect("hash");
        let second = hasher.hash("secret1").await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hashes_never_verify() {
        let verified = fast()
            .verify("secret1", &PasswordHash::new("not-a-bcrypt-hash"))
            .await
            .expect("verify");
        assert!(!verified);
    }

    #[tokio::test]
    async fn long_passwords_differ_past_the_bcrypt_limit() {
        let hasher = fast();
        let base = "p".repeat(72);
        let password = format!("{base}-suffix1");
        let hash = hasher.hash(&password).await.expect("hash");

        assert!(hasher.verify(&password, &hash).await.expect("verify"));
        assert!(!hasher.verify(&format!("{base}-suffix2"), &hash).await.expect("verify"));
        assert!(!hasher.verify(&base, &hash).await.expect("verify"));
    }

    #[rstest]
    #[case(0, 4)]
    #[case(12, 12)]
    #[case(99, 31)]
    fn cost_is_clamped(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(BcryptPasswordHasher::new(requested).cost(), expected);
    }
}
