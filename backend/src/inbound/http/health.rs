//! Health endpoints: a status summary for humans and liveness & readiness
//! probes for orchestration and load balancers.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::inbound::http::state::HttpState;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark startup work (migrations, bootstrap) as finished.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Configured issue store.
    #[schema(example = "postgres")]
    pub database: &'static str,
    /// Configured photo host.
    #[schema(example = "cloudinary")]
    pub asset_host: &'static str,
}

/// Report that the server is up and which adapters are wired.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is up", body = HealthReport)),
    tags = ["health"],
    operation_id = "health",
    security([])
)]
#[get("/health")]
pub async fn health(state: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(HealthReport {
            status: "ok",
            timestamp: state.clock.utc(),
            database: state.adapters.store,
            asset_host: state.adapters.asset_host,
        })
}

/// Readiness probe. Return 200 once startup finished and the store answers;
/// return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(lifecycle: web::Data<HealthState>, state: web::Data<HttpState>) -> HttpResponse {
    let ready = lifecycle.is_ready() && state.issues_query.store_ready().await;
    HealthState::probe_response(ready)
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(lifecycle: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(lifecycle.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::state::AdapterNames;
    use crate::inbound::http::test_utils::{TestPorts, test_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    async fn call(health_state: HealthState, state: HttpState, uri: &str) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(health_state))
                .app_data(web::Data::new(state))
                .service(web::scope("/api").service(health))
                .service(ready)
                .service(live),
        )
        .await;
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await
    }

    #[actix_web::test]
    async fn summary_names_adapters() {
        let state = test_state(TestPorts::default()).with_adapters(AdapterNames {
            store: "postgres",
            asset_host: "cloudinary",
        });
        let response = call(HealthState::new(), state, "/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "postgres");
        assert_eq!(body["assetHost"], "cloudinary");
        assert_eq!(body["timestamp"], "2025-06-01T09:30:00Z");
    }

    #[rstest]
    #[case(false, true, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(true, false, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(true, true, StatusCode::OK)]
    #[actix_web::test]
    async fn readiness_needs_startup_and_store(
        #[case] started: bool,
        #[case] store_up: bool,
        #[case] expected: StatusCode,
    ) {
        let mut ports = TestPorts::default();
        ports
            .issues_query
            .expect_store_ready()
            .returning(move || store_up);
        let health_state = HealthState::new();
        if started {
            health_state.mark_ready();
        }
        let response = call(health_state, test_state(ports), "/health/ready").await;
        assert_eq!(response.status(), expected);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some("no-store")
        );
    }

    #[actix_web::test]
    async fn liveness_flips_when_draining() {
        let health_state = HealthState::new();
        health_state.mark_unhealthy();
        let response = call(health_state, test_state(TestPorts::default()), "/health/live").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
