//! Tests for the domain user model.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[fixture]
fn alice(created_at: DateTime<Utc>) -> User {
    User::new(
        UserId::new(VALID_ID).expect("fixture id"),
        UserName::new("Alice").expect("fixture name"),
        EmailAddress::new("alice@example.com").expect("fixture email"),
        Role::User,
        created_at,
    )
}

#[rstest]
#[case("")]
#[case("not-a-uuid")]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
fn user_id_rejects_invalid_input(#[case] raw: &str) {
    assert_eq!(UserId::new(raw), Err(UserValidationError::InvalidId));
}

#[rstest]
#[case("", UserValidationError::EmptyName)]
#[case("   ", UserValidationError::EmptyName)]
#[case("A", UserValidationError::NameTooShort { min: USER_NAME_MIN })]
fn user_name_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserName::new(raw), Err(expected));
}

#[rstest]
fn user_name_rejects_overlong_input() {
    let raw = "a".repeat(USER_NAME_MAX + 1);
    assert_eq!(
        UserName::new(raw),
        Err(UserValidationError::NameTooLong { max: USER_NAME_MAX })
    );
}

#[rstest]
fn user_name_trims_whitespace() {
    let name = UserName::new("  Bob Stone ").expect("valid name");
    assert_eq!(name.as_ref(), "Bob Stone");
}

#[rstest]
#[case("alice@example.com")]
#[case("first.last@city.gov.uk")]
#[case("ops+voiceit@example.info")]
#[case("o-brien@my-town.org")]
fn email_accepts_common_addresses(#[case] raw: &str) {
    assert!(EmailAddress::new(raw).is_ok(), "{raw} should be accepted");
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("plainaddress", UserValidationError::InvalidEmail)]
#[case("@example.com", UserValidationError::InvalidEmail)]
#[case("alice@", UserValidationError::InvalidEmail)]
#[case("alice@example", UserValidationError::InvalidEmail)]
#[case("alice smith@example.com", UserValidationError::InvalidEmail)]
fn email_rejects_malformed_addresses(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(EmailAddress::new(raw), Err(expected));
}

#[rstest]
fn email_normalises_case_for_equality() {
    let upper = EmailAddress::new("ALICE@Example.com").expect("valid email");
    let lower = EmailAddress::new("alice@example.com").expect("valid email");
    assert_eq!(upper, lower);
}

#[rstest]
#[case("user", Role::User)]
#[case("admin", Role::Admin)]
fn role_parses_known_values(#[case] raw: &str, #[case] expected: Role) {
    assert_eq!(raw.parse::<Role>(), Ok(expected));
    assert_eq!(expected.as_str(), raw);
}

#[rstest]
fn role_rejects_unknown_values() {
    assert_eq!(
        "moderator".parse::<Role>(),
        Err(UserValidationError::UnknownRole("moderator".to_owned()))
    );
}

#[rstest]
fn user_serialises_without_credentials(alice: User, created_at: DateTime<Utc>) {
    let value = serde_json::to_value(&alice).expect("serialise user");
    assert_eq!(
        value,
        json!({
            "id": VALID_ID,
            "name": "Alice",
            "email": "alice@example.com",
            "role": "user",
            "createdAt": created_at,
            "updatedAt": created_at,
        })
    );
}

#[rstest]
fn with_timestamps_never_moves_updated_before_created(alice: User, created_at: DateTime<Utc>) {
    let earlier = created_at - chrono::TimeDelta::days(1);
    let user = alice.with_timestamps(created_at, earlier);
    assert_eq!(user.updated_at(), created_at);
}

#[rstest]
fn password_hash_debug_is_redacted() {
    let hash = PasswordHash::new("$2b$12$abcdefghijklmnopqrstuv");
    assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
}
