//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (auth, issues,
//!   users, admin, health, uploads)
//! - **Schemas**: Domain read models and request bodies
//! - **Security**: Bearer token authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AuthSession, CategoryShare, CommentAuthor, CommentView, Coordinates, Error, ErrorCode,
    IssueCategory, IssueStatistics, IssueStatus, IssueView, Location, ReporterCount,
    ReporterSummary, Role, StatsPeriod, StatusCounts, User,
};
use crate::inbound::http::auth::{LoginRequest, MeResponse, RegisterRequest};
use crate::inbound::http::health::HealthReport;
use crate::inbound::http::issues::{
    CommentRequest, IssueSubmissionForm, MessageResponse, StatusUpdateRequest,
};
use crate::inbound::http::users::ProfileResponse;

/// Name of the bearer security scheme in the generated document.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token returned by POST /api/auth/register or POST /api/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "VoiceIt backend API",
        description = "Civic issue reporting: accounts, issues with photos, upvotes, comments and moderation."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::issues::list_issues,
        crate::inbound::http::issues::get_issue,
        crate::inbound::http::issues::create_issue,
        crate::inbound::http::issues::toggle_upvote,
        crate::inbound::http::issues::update_status,
        crate::inbound::http::issues::add_comment,
        crate::inbound::http::issues::delete_issue,
        crate::inbound::http::users::profile,
        crate::inbound::http::users::my_issues,
        crate::inbound::http::admin::stats,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::uploads::get_upload,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        AuthSession,
        IssueView,
        IssueCategory,
        IssueStatus,
        Location,
        Coordinates,
        ReporterSummary,
        CommentView,
        CommentAuthor,
        IssueStatistics,
        StatsPeriod,
        StatusCounts,
        CategoryShare,
        ReporterCount,
        RegisterRequest,
        LoginRequest,
        MeResponse,
        StatusUpdateRequest,
        CommentRequest,
        MessageResponse,
        IssueSubmissionForm,
        ProfileResponse,
        HealthReport,
    )),
    tags(
        (name = "auth", description = "Registration, login and the current user"),
        (name = "issues", description = "Civic issue reports, upvotes and comments"),
        (name = "users", description = "The signed-in user's profile and reports"),
        (name = "admin", description = "Moderator analytics"),
        (name = "health", description = "Endpoints for health checks"),
        (name = "uploads", description = "Locally stored issue photos")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the OpenAPI surface.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("Error", &["code", "message", "traceId", "details"])]
    #[case("User", &["id", "name", "email", "role", "createdAt", "updatedAt"])]
    #[case("IssueView", &["id", "title", "location", "images", "upvotes", "upvotedBy", "comments"])]
    #[case("HealthReport", &["status", "timestamp", "database", "assetHost"])]
    fn schemas_expose_camel_case_fields(#[case] name: &str, #[case] fields: &[&str]) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");
        for field in fields {
            assert_object_schema_has_field(schema, field);
        }
    }

    #[rstest]
    fn user_schema_never_mentions_password() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("serialise document");
        assert!(!json.to_lowercase().contains("passwordhash"));
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key(BEARER_SCHEME));
    }

    #[rstest]
    #[case("/api/auth/register")]
    #[case("/api/issues/{id}/upvote")]
    #[case("/api/admin/stats")]
    #[case("/health/ready")]
    fn paths_are_documented(#[case] path: &str) {
        assert!(ApiDoc::openapi().paths.paths.contains_key(path));
    }
}
