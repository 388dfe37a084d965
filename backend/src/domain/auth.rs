//! Authentication primitives: registration input, login credentials, and
//! bearer token claims.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{EmailAddress, FieldError, FieldErrors, User, UserId, UserName, UserValidationError};

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 6;

fn name_field_error(error: &UserValidationError) -> FieldError {
    let code = match error {
        UserValidationError::EmptyName => "empty",
        UserValidationError::NameTooShort { .. } => "too_short",
        _ => "too_long",
    };
    FieldError::new("name", code, error.to_string())
}

fn email_field_error(error: &UserValidationError) -> FieldError {
    let code = match error {
        UserValidationError::EmptyEmail => "empty",
        UserValidationError::EmailTooLong { .. } => "too_long",
        _ => "invalid_email",
    };
    FieldError::new("email", code, error.to_string())
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < PASSWORD_MIN {
        errors.push(FieldError::new(
            "password",
            "too_short",
            format!("password must be at least {PASSWORD_MIN} characters"),
        ));
    }
}

/// Validated sign-up request.
///
/// ## Invariants
/// - `name` and `email` satisfy their value-type rules.
/// - `password` is at least [`PASSWORD_MIN`] characters; it is wiped from
///   memory on drop.
///
/// # Examples
/// ```
/// use voiceit::domain::Registration;
///
/// let registration = Registration::try_from_parts("Alice", "Alice@Example.com", "secret1").unwrap();
/// assert_eq!(registration.email().as_ref(), "alice@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: UserName,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate every field, collecting all failures.
    pub fn try_from_parts(name: &str, email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = UserName::new(name)
            .map_err(|error| errors.push(name_field_error(&error)))
            .ok();
        let email = EmailAddress::new(email)
            .map_err(|error| errors.push(email_field_error(&error)))
            .ok();
        check_password(password, &mut errors);

        match (name, email) {
            (Some(name), Some(email)) if errors.is_empty() => Ok(Self {
                name,
                email,
                password: Zeroizing::new(password.to_owned()),
            }),
            _ => Err(errors),
        }
    }

    /// Requested display name.
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext password, only to be handed to the password hasher.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised to lower case.
/// - `password` is non-empty and retains caller-provided whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = EmailAddress::new(email)
            .map_err(|error| errors.push(email_field_error(&error)))
            .ok();
        if password.is_empty() {
            errors.push(FieldError::new("password", "empty", "password is required"));
        }
        match email {
            Some(email) if errors.is_empty() => Ok(Self {
                email,
                password: Zeroizing::new(password.to_owned()),
            }),
            _ => Err(errors),
        }
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Signed bearer token handed to clients.
#[derive(Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded token text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Claims carried by a bearer token. Only the subject identifies the user;
/// role and profile data are re-read on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Whether the token is no longer valid at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of a successful register or login.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[schema(value_type = String)]
    pub token: AccessToken,
    pub user: User,
}
