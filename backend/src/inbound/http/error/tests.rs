//! Status mapping, redaction and the JSON extractor hook.

use super::*;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE: &str = "9e8d7c6b-5a49-4382-a1b0-c9d8e7f6a5b4";

#[fixture]
fn store_crash() -> Error {
    Error::internal("relation \"issues\" does not exist")
        .with_trace_id(TRACE)
        .with_details(json!({"query": "SELECT ..."}))
}

async fn render(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = error.error_response();
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    (status, header, serde_json::from_slice(&bytes).expect("error JSON"))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no token"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("admins only"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("issue not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("email taken"), StatusCode::CONFLICT)]
#[case(Error::upload_failed("cdn down"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(error.status_code(), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace(store_crash: Error) {
    let (status, header, body) = render(&store_crash).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE));
    assert_eq!(body.message(), REDACTED);
    assert_eq!(body.trace_id(), Some(TRACE));
    assert!(body.details().is_none());
}

#[rstest]
fn exposing_internal_detail_returns_the_original(store_crash: Error) {
    assert_eq!(client_view(&store_crash, true).as_ref(), &store_crash);
}

#[rstest]
#[case(Error::upload_failed("image upload failed"))]
#[case(Error::service_unavailable("database unavailable"))]
fn other_server_faults_keep_their_message(#[case] error: Error) {
    assert!(matches!(client_view(&error, false), Cow::Borrowed(_)));
}

#[actix_web::test]
async fn validation_details_reach_the_client() {
    let error = Error::invalid_request("validation failed")
        .with_details(json!({"errors": [{"field": "email", "code": "invalid", "message": "email is invalid"}]}));
    let (status, header, body) = render(&error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header, None);
    assert_eq!(body.details().map(|d| d["errors"][0]["field"].clone()), Some(json!("email")));
}

#[actix_web::test]
async fn malformed_json_uses_the_error_envelope() {
    use actix_web::{App, HttpResponse, post, test as actix_test};

    #[post("/comments")]
    async fn comment(body: web::Json<serde_json::Value>) -> HttpResponse {
        HttpResponse::Ok().json(body.into_inner())
    }

    let app = actix_test::init_service(App::new().app_data(json_config()).service(comment)).await;
    let request = actix_test::TestRequest::post()
        .uri("/comments")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"text\": ")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload: Error = actix_test::read_body_json(response).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
}
