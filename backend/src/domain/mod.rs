//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities shared by the HTTP adapter and the
//! persistence adapters, plus the services implementing the driving ports.
//! Types validate on construction and document their invariants and serde
//! contracts in Rustdoc.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: transport-agnostic error payload.
//! - [`User`], [`Registration`], [`LoginCredentials`]: account model.
//! - [`Issue`], [`NewIssue`], [`IssueView`]: issue aggregate and read model.
//! - [`AccountService`], [`IssueService`]: driving port implementations.

pub mod account_service;
pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod issue;
pub mod issue_service;
pub mod issue_view;
pub mod ports;
pub mod statistics;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::account_service::{AccountService, DEFAULT_TOKEN_TTL_DAYS, RegistrationPolicy};
pub use self::auth::{
    AccessToken, AuthSession, LoginCredentials, PASSWORD_MIN, Registration,
    TokenClaims,
};
pub use self::bootstrap::{ensure_admin, seed_sample_issues};
pub use self::error::{Error, ErrorCode};
pub use self::issue::{
    Comment, CommentText, Coordinates, ImageUpload, Issue, IssueCategory, IssueId, IssueRecord,
    IssueStatus, Location, MAX_IMAGE_BYTES, MAX_IMAGES, NewIssue, NewIssueParts, UnknownVariant,
    UpvoteChange, image_too_large, too_many_images,
};
pub use self::issue_service::{DEFAULT_UPLOAD_TIMEOUT, IssueService, StatusUpdatePolicy};
pub use self::issue_view::{
    CommentAuthor, CommentView, IssueView, ReporterSummary, UserDirectory, referenced_users,
};
pub use self::statistics::{
    CategoryShare, IssueStatistics, ReporterCount, StatsPeriod, StatusCounts,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, PasswordHash, Role, User, UserAccount, UserId, UserName, UserValidationError,
};
pub use self::validation::{FieldError, FieldErrors};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use voiceit::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
