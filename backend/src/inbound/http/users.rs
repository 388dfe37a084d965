//! Users API handlers.
//!
//! ```text
//! GET /api/users/profile
//! GET /api/users/my-issues
//! ```

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, IssueView, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Profile payload: the user plus the issues they reported.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: User,
    pub reported_issues: Vec<IssueView>,
}

/// Return the caller's profile and reported issues.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "userProfile"
)]
#[get("/users/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user = user.into_inner();
    let reported_issues = state.issues_query.list_reported_by(user.id()).await?;
    Ok(web::Json(ProfileResponse {
        user,
        reported_issues,
    }))
}

/// List issues reported by the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/users/my-issues",
    responses(
        (status = 200, description = "Reported issues", body = [IssueView]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "myIssues"
)]
#[get("/users/my-issues")]
pub async fn my_issues(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<IssueView>>> {
    Ok(web::Json(
        state.issues_query.list_reported_by(user.id()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{TestPorts, state_with_user};
    use crate::test_support::citizen;
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    async fn get(state: HttpState, uri: &str) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").service(profile).service(my_issues)),
        )
        .await;
        let request = actix_test::TestRequest::get()
            .uri(uri)
            .insert_header((AUTHORIZATION, "Bearer good"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        let status = response.status();
        (status, actix_test::read_body_json(response).await)
    }

    #[actix_web::test]
    async fn profile_embeds_reported_issues() {
        let user = citizen();
        let id = *user.id();
        let mut ports = TestPorts::default();
        ports
            .issues_query
            .expect_list_reported_by()
            .withf(move |reporter: &UserId| *reporter == id)
            .return_once(|_| Ok(Vec::new()));

        let (status, body) = get(state_with_user(ports, user), "/api/users/profile").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Alice");
        assert_eq!(body["reportedIssues"], Value::Array(Vec::new()));
    }

    #[actix_web::test]
    async fn my_issues_surfaces_store_outage() {
        let mut ports = TestPorts::default();
        ports
            .issues_query
            .expect_list_reported_by()
            .return_once(|_| Err(Error::service_unavailable("issue repository unavailable")));

        let (status, body) = get(state_with_user(ports, citizen()), "/api/users/my-issues").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "service_unavailable");
    }
}
