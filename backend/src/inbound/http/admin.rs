//! Admin analytics handler.

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Error, IssueStatistics, StatsPeriod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Query string of the statistics endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// `all` (default), `today`, `week` (last 7 days) or `month` (last 30 days).
    #[serde(default)]
    #[param(value_type = Option<StatsPeriod>)]
    pub period: StatsPeriod,
}

/// Dashboard statistics over the issues created within the requested period.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Statistics", body = IssueStatistics),
        (status = 400, description = "Unknown period", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<StatsQuery>,
) -> ApiResult<web::Json<IssueStatistics>> {
    let period = query.into_inner().period;
    Ok(web::Json(state.issues_query.statistics(&user, period).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserDirectory;
    use crate::inbound::http::error::query_config;
    use crate::inbound::http::test_utils::{TestPorts, state_with_user};
    use crate::test_support::{admin, citizen};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case(true, StatusCode::OK)]
    #[case(false, StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn stats_follow_service_authorisation(
        #[case] as_admin: bool,
        #[case] expected: StatusCode,
    ) {
        let mut ports = TestPorts::default();
        ports.issues_query.expect_statistics().return_once(|actor, _| {
            if actor.is_admin() {
                Ok(IssueStatistics::compute(&[], &UserDirectory::new()))
            } else {
                Err(Error::forbidden("Admin access required"))
            }
        });
        let user = if as_admin { admin() } else { citizen() };
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_user(ports, user)))
                .service(web::scope("/api").service(stats)),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), expected);
    }

    #[rstest]
    #[case::default("", StatsPeriod::All)]
    #[case::all("?period=all", StatsPeriod::All)]
    #[case::today("?period=today", StatsPeriod::Today)]
    #[case::week("?period=week", StatsPeriod::Week)]
    #[case::month("?period=month", StatsPeriod::Month)]
    #[actix_web::test]
    async fn period_reaches_the_service(#[case] query: &str, #[case] expected: StatsPeriod) {
        let mut ports = TestPorts::default();
        ports
            .issues_query
            .expect_statistics()
            .withf(move |_, period| *period == expected)
            .return_once(|_, _| Ok(IssueStatistics::compute(&[], &UserDirectory::new())));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_user(ports, admin())))
                .app_data(query_config())
                .service(web::scope("/api").service(stats)),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri(&format!("/api/admin/stats{query}"))
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unknown_period_is_an_invalid_request() {
        let mut ports = TestPorts::default();
        ports.issues_query.expect_statistics().times(0);
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_user(ports, admin())))
                .app_data(query_config())
                .service(web::scope("/api").service(stats)),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri("/api/admin/stats?period=decade")
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Error = actix_test::read_body_json(response).await;
        assert_eq!(body.code(), crate::domain::ErrorCode::InvalidRequest);
    }
}
