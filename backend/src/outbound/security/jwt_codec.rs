//! HS256 JSON Web Token codec.
//!
//! Expiry is carried in the standard `exp` claim but not enforced here; the
//! account service compares it against its own clock so tests can move time.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenCodec, TokenCodecError};
use crate::domain::{AccessToken, TokenClaims, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtTokenCodec {
    /// HS256 codec keyed with `secret`. Expiry is checked against the
    /// caller's clock, not here.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl std::fmt::Debug for JwtTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

fn timestamp(seconds: i64, claim: &str) -> Result<DateTime<Utc>, TokenCodecError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenCodecError::invalid(format!("{claim} is out of range")))
}

impl TokenCodec for JwtTokenCodec {
    fn encode(&self, claims: &TokenClaims) -> Result<AccessToken, TokenCodecError> {
        let payload = Claims {
            sub: claims.subject.to_string(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map(AccessToken::new)
            .map_err(|err| TokenCodecError::encoding(err.to_string()))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenCodecError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| TokenCodecError::invalid(err.to_string()))?;
        let Claims { sub, iat, exp } = data.claims;
        let subject =
            UserId::new(&sub).map_err(|_| TokenCodecError::invalid("subject is not a user id"))?;
        Ok(TokenClaims {
            subject,
            issued_at: timestamp(iat, "iat")?,
            expires_at: timestamp(exp, "exp")?,
        })
    }
}
