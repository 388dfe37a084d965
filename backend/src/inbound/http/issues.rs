//! Issue API handlers.
//!
//! ```text
//! GET /api/issues
//! GET /api/issues/{id}
//! POST /api/issues (multipart)
//! POST /api/issues/{id}/upvote
//! PATCH /api/issues/{id}/status {"status":"in-progress"}
//! POST /api/issues/{id}/comments {"text":"Still there"}
//! DELETE /api/issues/{id}
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CommentText, Error, FieldError, FieldErrors, IssueCategory, IssueId, IssueStatus, IssueView,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AuthenticatedUser;
use crate::inbound::http::multipart::read_issue_submission;
use crate::inbound::http::state::HttpState;

fn parse_issue_id(raw: &str) -> Result<IssueId, Error> {
    raw.parse().map_err(|_| {
        FieldErrors::from(FieldError::new("id", "invalid_id", "invalid issue id")).into_error()
    })
}

/// Request body for `PATCH /api/issues/{id}/status`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct StatusUpdateRequest {
    #[schema(example = "in-progress")]
    pub status: String,
}

/// Request body for `POST /api/issues/{id}/comments`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct CommentRequest {
    pub text: String,
}

/// Confirmation body for deletions.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Multipart form accepted by `POST /api/issues`; documentation only.
#[derive(ToSchema)]
pub struct IssueSubmissionForm {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Up to five image files of at most 5 MiB each.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

/// List every issue, newest first.
#[utoipa::path(
    get,
    path = "/api/issues",
    responses(
        (status = 200, description = "Issues", body = [IssueView]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["issues"],
    operation_id = "listIssues",
    security([])
)]
#[get("/issues")]
pub async fn list_issues(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<IssueView>>> {
    Ok(web::Json(state.issues_query.list_issues().await?))
}

/// Fetch one issue.
#[utoipa::path(
    get,
    path = "/api/issues/{id}",
    params(("id" = String, Path, description = "Issue identifier")),
    responses(
        (status = 200, description = "Issue", body = IssueView),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["issues"],
    operation_id = "getIssue",
    security([])
)]
#[get("/issues/{id}")]
pub async fn get_issue(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<IssueView>> {
    let id = parse_issue_id(&path)?;
    Ok(web::Json(state.issues_query.get_issue(&id).await?))
}

/// Report a new issue with up to five photos.
#[utoipa::path(
    post,
    path = "/api/issues",
    request_body(content = IssueSubmissionForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Issue created", body = IssueView),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Upload failed", body = Error)
    ),
    tags = ["issues"],
    operation_id = "createIssue"
)]
#[post("/issues")]
pub async fn create_issue(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let submission = read_issue_submission(payload).await?;
    let issue = state.issues.create_issue(&user, submission).await?;
    Ok(HttpResponse::Created().json(issue))
}

/// Toggle the caller's upvote.
#[utoipa::path(
    post,
    path = "/api/issues/{id}/upvote",
    params(("id" = String, Path, description = "Issue identifier")),
    responses(
        (status = 200, description = "Updated issue", body = IssueView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["issues"],
    operation_id = "toggleUpvote"
)]
#[post("/issues/{id}/upvote")]
pub async fn toggle_upvote(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<IssueView>> {
    let id = parse_issue_id(&path)?;
    Ok(web::Json(state.issues.toggle_upvote(&user, &id).await?))
}

/// Change an issue's status.
#[utoipa::path(
    patch,
    path = "/api/issues/{id}/status",
    params(("id" = String, Path, description = "Issue identifier")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated issue", body = IssueView),
        (status = 400, description = "Invalid status", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["issues"],
    operation_id = "updateIssueStatus"
)]
#[patch("/issues/{id}/status")]
pub async fn update_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<IssueView>> {
    let id = parse_issue_id(&path)?;
    let status: IssueStatus = payload.status.trim().parse().map_err(|error| {
        FieldErrors::from(FieldError::new("status", "invalid_choice", format!("{error}")))
            .into_error()
    })?;
    Ok(web::Json(state.issues.update_status(&user, &id, status).await?))
}

/// Append a comment.
#[utoipa::path(
    post,
    path = "/api/issues/{id}/comments",
    params(("id" = String, Path, description = "Issue identifier")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Updated issue", body = IssueView),
        (status = 400, description = "Invalid comment", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["issues"],
    operation_id = "addComment"
)]
#[post("/issues/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<web::Json<IssueView>> {
    let id = parse_issue_id(&path)?;
    let text = CommentText::new(&payload.text)?;
    Ok(web::Json(state.issues.add_comment(&user, &id, text).await?))
}

/// Delete an issue and its photos. Admin only.
#[utoipa::path(
    delete,
    path = "/api/issues/{id}",
    params(("id" = String, Path, description = "Issue identifier")),
    responses(
        (status = 200, description = "Issue deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["issues"],
    operation_id = "deleteIssue"
)]
#[delete("/issues/{id}")]
pub async fn delete_issue(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let id = parse_issue_id(&path)?;
    state.issues.delete_issue(&user, &id).await?;
    Ok(web::Json(MessageResponse {
        message: "Issue deleted successfully".to_owned(),
    }))
}

#[cfg(test)]
#[path = "issues_tests.rs"]
mod tests;
