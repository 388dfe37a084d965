//! Account domain service implementing the [`AuthService`] driving port.
//!
//! Tokens carry only the user id; role and profile are re-read from the user
//! store on every [`AuthService::authenticate`] call so role changes and
//! removed accounts take effect immediately.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AuthService, PasswordHasher, PasswordHasherError, TokenCodec, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    AuthSession, EmailAddress, Error, LoginCredentials, Registration, Role, TokenClaims, User,
    UserAccount, UserId,
};

/// Default bearer token lifetime in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Which role a new registration receives.
///
/// By default every registration is a plain user. A reserved administrator
/// address only grants the admin role when explicitly enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationPolicy {
    reserved_admin_email: Option<EmailAddress>,
    grants_role: bool,
}

impl RegistrationPolicy {
    /// Grant `admin` to registrations using `email` when `grants_role` is set.
    pub fn reserved_admin(email: EmailAddress, grants_role: bool) -> Self {
        Self {
            reserved_admin_email: Some(email),
            grants_role,
        }
    }

    fn role_for(&self, email: &EmailAddress) -> Role {
        match &self.reserved_admin_email {
            Some(reserved) if self.grants_role && reserved == email => Role::Admin,
            _ => Role::User,
        }
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("user already exists with this email")
        }
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

/// Registration, login and token resolution over a user store.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    token_ttl: TimeDelta,
    policy: RegistrationPolicy,
}

impl<U, H> AccountService<U, H> {
    /// Create a service issuing tokens valid for [`DEFAULT_TOKEN_TTL_DAYS`].
    pub fn new(
        users: Arc<U>,
        hasher: Arc<H>,
        tokens: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            token_ttl: TimeDelta::days(DEFAULT_TOKEN_TTL_DAYS),
            policy: RegistrationPolicy::default(),
        }
    }

    /// Override the token lifetime.
    pub fn with_token_ttl(mut self, token_ttl: TimeDelta) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Override the registration role policy.
    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<U, H> AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    fn sign(&self, user: User) -> Result<AuthSession, Error> {
        let issued_at = self.clock.utc();
        let claims = TokenClaims {
            subject: *user.id(),
            issued_at,
            expires_at: issued_at + self.token_ttl,
        };
        let token = self
            .tokens
            .encode(&claims)
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(AuthSession { token, user })
    }

    /// Create an account with an explicit role unless the email is taken.
    ///
    /// Returns the stored user and whether it was created by this call.
    pub async fn ensure_account(
        &self,
        registration: &Registration,
        role: Role,
    ) -> Result<(User, bool), Error> {
        if let Some(existing) = self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_user_error)?
        {
            return Ok((existing.user, false));
        }
        let user = self.create_account(registration, role).await?;
        Ok((user, true))
    }

    async fn create_account(&self, registration: &Registration, role: Role) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(registration.password())
            .await
            .map_err(map_hasher_error)?;
        let user = User::new(
            UserId::random(),
            registration.name().clone(),
            registration.email().clone(),
            role,
            self.clock.utc(),
        );
        let account = UserAccount {
            user,
            password_hash,
        };
        self.users.create(&account).await.map_err(map_user_error)?;
        Ok(account.user)
    }
}

#[async_trait]
impl<U, H> AuthService for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, registration: &Registration) -> Result<AuthSession, Error> {
        let existing = self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_user_error)?;
        if existing.is_some() {
            return Err(Error::conflict("user already exists with this email"));
        }

        let role = self.policy.role_for(registration.email());
        if role == Role::Admin {
            warn!(email = %registration.email(), "reserved administrator email registered");
        }
        let user = self.create_account(registration, role).await?;
        info!(user_id = %user.id(), role = role.as_str(), "registered user");
        self.sign(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let valid = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hasher_error)?;
        if !valid {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        self.sign(account.user)
    }

    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| Error::unauthorized("invalid token"))?;
        if claims.is_expired_at(self.clock.utc()) {
            return Err(Error::unauthorized("token expired"));
        }
        self.users
            .find_by_id(&claims.subject)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("token is not valid: user not found"))
    }

    async fn current_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
