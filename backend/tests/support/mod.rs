//! Shared wiring for HTTP integration tests.
//!
//! Builds the real services over in-memory stores and a temporary upload
//! directory, mounted with the same route table and middleware as the
//! server binary.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::{App, test as actix_test, web};
use mockable::DefaultClock;
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;

use voiceit::Trace;
use voiceit::domain::{AccountService, EmailAddress, IssueService, RegistrationPolicy};
use voiceit::inbound::http::error::{json_config, query_config};
use voiceit::inbound::http::health::HealthState;
use voiceit::inbound::http::router;
use voiceit::inbound::http::state::{HttpState, HttpStatePorts};
use voiceit::middleware::ErrorDetail;
use voiceit::outbound::assets::FilesystemAssetHost;
use voiceit::outbound::memory::{MemoryIssueRepository, MemoryUserRepository};
use voiceit::outbound::security::{BcryptPasswordHasher, JwtTokenCodec};

/// Signing secret shared by the harness and tests forging tokens.
pub const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const BOUNDARY: &str = "voiceit-integration-boundary";
/// Registrations with this address receive the admin role.
pub const ADMIN_EMAIL: &str = "admin@voiceit.com";

/// Services wired over throwaway storage.
pub struct Harness {
    pub state: HttpState,
    pub health: web::Data<HealthState>,
    _uploads: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("upload dir");
        let host = FilesystemAssetHost::open(
            uploads.path(),
            Url::parse("http://localhost:8080/uploads/").expect("base url"),
        )
        .expect("open upload dir");
        let clock = Arc::new(DefaultClock);
        let users = Arc::new(MemoryUserRepository::new());
        let accounts = AccountService::new(
            Arc::clone(&users),
            Arc::new(BcryptPasswordHasher::new(4)),
            Arc::new(JwtTokenCodec::new(SECRET)),
            clock.clone(),
        )
        .with_registration_policy(RegistrationPolicy::reserved_admin(
            EmailAddress::new(ADMIN_EMAIL).expect("admin email"),
            true,
        ));
        let issues = Arc::new(IssueService::new(
            Arc::new(MemoryIssueRepository::new()),
            users,
            Arc::new(host.clone()),
            clock.clone(),
        ));
        let state = HttpState::new(
            HttpStatePorts {
                auth: Arc::new(accounts),
                issues: issues.clone(),
                issues_query: issues,
            },
            clock,
        )
        .with_uploads(host);
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        Self {
            state,
            health,
            _uploads: uploads,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.health.clone())
            .app_data(web::Data::new(self.state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .wrap(ErrorDetail::default())
            .wrap(Trace)
            .service(web::scope("/api").configure(router::api))
            .configure(router::root)
    }
}

/// Send a request and decode the JSON body (`Null` when empty).
pub async fn send(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    request: actix_test::TestRequest,
) -> (StatusCode, Value) {
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

pub fn with_token(request: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

/// Register an account and return its token and user id.
pub async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    name: &str,
    email: &str,
) -> (String, String) {
    let (status, body) = send(
        app,
        actix_test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": name, "email": email, "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let token = body["token"].as_str().expect("token").to_owned();
    let id = body["user"]["id"].as_str().expect("user id").to_owned();
    (token, id)
}

/// Multipart body for an issue report with `images` PNG attachments.
pub fn issue_form(title: &str, images: usize) -> actix_test::TestRequest {
    let mut body = Vec::new();
    let fields = [
        ("title", title),
        ("description", "Deep hole in the right lane"),
        ("category", "pothole"),
        ("address", "1 Main St"),
        ("latitude", "40.7"),
        ("longitude", "-74.0"),
    ];
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for index in 0..images {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"photo{index}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("png-bytes-{index}").as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    actix_test::TestRequest::post()
        .uri("/api/issues")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}
