//! Tests for the account service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{
    MockPasswordHasher, MockTokenCodec, MockUserRepository, TokenCodecError,
};
use crate::domain::{AccessToken, ErrorCode, PasswordHash};
use crate::test_support::{MutableClock, citizen, fixture_timestamp};
use rstest::rstest;

type Service = AccountService<MockUserRepository, MockPasswordHasher>;

fn make_service(
    users: MockUserRepository,
    hasher: MockPasswordHasher,
    tokens: MockTokenCodec,
    clock: Arc<MutableClock>,
) -> Service {
    AccountService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens), clock)
}

fn registration(email: &str) -> Registration {
    Registration::try_from_parts("Alice", email, "secret1").expect("valid registration")
}

fn signing_codec() -> MockTokenCodec {
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_encode()
        .returning(|claims| Ok(AccessToken::new(format!("token-for-{}", claims.subject))));
    tokens
}

fn hashing_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|password| Ok(PasswordHash::new(format!("hashed:{password}"))));
    hasher
}

fn stored_account(user: User) -> UserAccount {
    UserAccount {
        user,
        password_hash: PasswordHash::new("hashed:secret1"),
    }
}

#[tokio::test]
async fn register_stores_hash_and_signs_thirty_day_token() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().times(1).return_once(|_| Ok(None));
    users
        .expect_create()
        .withf(|account: &UserAccount| {
            account.password_hash.as_str() == "hashed:secret1"
                && account.user.role() == Role::User
                && account.user.email().as_ref() == "alice@example.com"
        })
        .times(1)
        .return_once(|_| Ok(()));
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_encode()
        .withf(|claims: &TokenClaims| {
            claims.issued_at == fixture_timestamp()
                && claims.expires_at - claims.issued_at == TimeDelta::days(DEFAULT_TOKEN_TTL_DAYS)
        })
        .times(1)
        .return_once(|_| Ok(AccessToken::new("signed")));

    let service = make_service(users, hashing_hasher(), tokens, Arc::default());
    let session = service
        .register(&registration("Alice@Example.com"))
        .await
        .expect("registration succeeds");

    assert_eq!(session.token.as_str(), "signed");
    assert_eq!(session.user.email().as_ref(), "alice@example.com");
    assert_eq!(session.user.created_at(), fixture_timestamp());
}

#[tokio::test]
async fn register_rejects_existing_email_without_writing() {
    let existing = stored_account(citizen());
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .times(1)
        .return_once(move |_| Ok(Some(existing)));
    users.expect_create().times(0);
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().times(0);

    let service = make_service(users, hasher, MockTokenCodec::new(), Arc::default());
    let error = service
        .register(&registration("ALICE@example.com"))
        .await
        .expect_err("duplicate email");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn register_maps_insert_race_to_conflict() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(|_| Ok(None));
    users
        .expect_create()
        .return_once(|_| Err(UserPersistenceError::duplicate_email("alice@example.com")));

    let service = make_service(users, hashing_hasher(), MockTokenCodec::new(), Arc::default());
    let error = service
        .register(&registration("alice@example.com"))
        .await
        .expect_err("race lost");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(true, "boss@city.gov", Role::Admin)]
#[case(false, "boss@city.gov", Role::User)]
#[case(true, "someone@city.gov", Role::User)]
#[tokio::test]
async fn reserved_admin_email_only_grants_role_when_enabled(
    #[case] grants_role: bool,
    #[case] email: &str,
    #[case] expected: Role,
) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(|_| Ok(None));
    users
        .expect_create()
        .withf(move |account: &UserAccount| account.user.role() == expected)
        .times(1)
        .return_once(|_| Ok(()));
    let policy = RegistrationPolicy::reserved_admin(
        EmailAddress::new("boss@city.gov").expect("email"),
        grants_role,
    );

    let service = make_service(users, hashing_hasher(), signing_codec(), Arc::default())
        .with_registration_policy(policy);
    let session = service
        .register(&registration(email))
        .await
        .expect("registration succeeds");
    assert_eq!(session.user.role(), expected);
}

#[rstest]
#[case::unknown_email(false)]
#[case::wrong_password(true)]
#[tokio::test]
async fn login_failures_share_one_message(#[case] account_exists: bool) {
    let stored = account_exists.then(|| stored_account(citizen()));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(stored));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().returning(|_, _| Ok(false));

    let service = make_service(users, hasher, MockTokenCodec::new(), Arc::default());
    let credentials =
        LoginCredentials::try_from_parts("alice@example.com", "wrong").expect("credentials");
    let error = service.login(&credentials).await.expect_err("login fails");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "invalid email or password");
}

#[tokio::test]
async fn login_signs_token_for_matching_password() {
    let user = citizen();
    let id = *user.id();
    let stored = stored_account(user);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(stored)));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|password: &str, hash: &PasswordHash| {
            password == "secret1" && hash.as_str() == "hashed:secret1"
        })
        .return_once(|_, _| Ok(true));

    let service = make_service(users, hasher, signing_codec(), Arc::default());
    let credentials =
        LoginCredentials::try_from_parts("alice@example.com", "secret1").expect("credentials");
    let session = service.login(&credentials).await.expect("login succeeds");
    assert_eq!(session.token.as_str(), format!("token-for-{id}"));
}

fn claims_for(subject: UserId) -> TokenClaims {
    TokenClaims {
        subject,
        issued_at: fixture_timestamp(),
        expires_at: fixture_timestamp() + TimeDelta::days(DEFAULT_TOKEN_TTL_DAYS),
    }
}

#[tokio::test]
async fn authenticate_reloads_user_from_store() {
    let user = citizen();
    let id = *user.id();
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_decode()
        .return_once(move |_| Ok(claims_for(id)));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .withf(move |candidate: &UserId| *candidate == id)
        .return_once(move |_| Ok(Some(user)));

    let service = make_service(users, MockPasswordHasher::new(), tokens, Arc::default());
    let resolved = service.authenticate("token").await.expect("valid token");
    assert_eq!(*resolved.id(), id);
}

#[tokio::test]
async fn authenticate_rejects_expired_tokens() {
    let id = UserId::random();
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_decode()
        .return_once(move |_| Ok(claims_for(id)));
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().times(0);
    let clock = Arc::new(MutableClock::default());
    clock.advance(TimeDelta::days(DEFAULT_TOKEN_TTL_DAYS));

    let service = make_service(users, MockPasswordHasher::new(), tokens, clock);
    let error = service.authenticate("token").await.expect_err("expired");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "token expired");
}

#[tokio::test]
async fn authenticate_rejects_malformed_tokens() {
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_decode()
        .return_once(|_| Err(TokenCodecError::invalid("bad signature")));

    let service = make_service(
        MockUserRepository::new(),
        MockPasswordHasher::new(),
        tokens,
        Arc::default(),
    );
    let error = service.authenticate("garbage").await.expect_err("invalid");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn authenticate_rejects_tokens_for_missing_users() {
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_decode()
        .return_once(|_| Ok(claims_for(UserId::random())));
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let service = make_service(users, MockPasswordHasher::new(), tokens, Arc::default());
    let error = service.authenticate("token").await.expect_err("user gone");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn store_outages_map_to_service_unavailable() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Err(UserPersistenceError::connection("refused")));

    let service = make_service(
        users,
        MockPasswordHasher::new(),
        MockTokenCodec::new(),
        Arc::default(),
    );
    let error = service
        .current_user(&UserId::random())
        .await
        .expect_err("store down");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn ensure_account_is_idempotent() {
    let existing = stored_account(citizen());
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(move |_| Ok(Some(existing)));
    users.expect_create().times(0);

    let service = make_service(
        users,
        MockPasswordHasher::new(),
        MockTokenCodec::new(),
        Arc::default(),
    );
    let (_, created) = service
        .ensure_account(&registration("alice@example.com"), Role::Admin)
        .await
        .expect("lookup succeeds");
    assert!(!created);
}
