use super::*;
use rstest::rstest;

#[rstest]
#[case(UserPersistenceError::connection("refused"), "user repository connection failed: refused")]
#[case(UserPersistenceError::query("syntax"), "user repository query failed: syntax")]
#[case(
    UserPersistenceError::duplicate_email("alice@example.com"),
    "email alice@example.com is already registered"
)]
fn user_persistence_errors_format_messages(
    #[case] error: UserPersistenceError,
    #[case] expected: &str,
) {
    assert_eq!(error.to_string(), expected);
}

#[rstest]
fn asset_host_rejections_carry_status() {
    let error = AssetHostError::rejected(401_u16, "bad signature");
    assert_eq!(
        error.to_string(),
        "asset host rejected request with status 401: bad signature"
    );
    assert_eq!(
        error,
        AssetHostError::Rejected {
            status: 401,
            message: "bad signature".to_owned(),
        }
    );
}

#[rstest]
fn token_codec_mock_can_stand_in_for_adapters() {
    let mut codec = MockTokenCodec::new();
    codec
        .expect_decode()
        .times(1)
        .return_once(|_| Err(TokenCodecError::invalid("bad signature")));
    let error = codec.decode("a.b.c").expect_err("decode fails");
    assert_eq!(error.to_string(), "invalid token: bad signature");
}
