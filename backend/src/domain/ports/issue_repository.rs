//! Port for issue persistence.
//!
//! Adapters own the atomicity of upvote toggles: two concurrent toggles by
//! different users must both land, and the stored count must equal the size of
//! the stored membership set after every commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Comment, Issue, IssueId, IssueStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by issue repository adapters.
    pub enum IssuePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "issue repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "issue repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Persist a freshly reported issue.
    async fn insert(&self, issue: &Issue) -> Result<(), IssuePersistenceError>;

    /// Fetch one issue with its images, upvoters and comments.
    async fn find_by_id(&self, id: &IssueId) -> Result<Option<Issue>, IssuePersistenceError>;

    /// All issues, newest first. Ties on `created_at` are broken by id.
    async fn list(&self) -> Result<Vec<Issue>, IssuePersistenceError>;

    /// Issues reported by `reporter`, newest first.
    async fn list_by_reporter(&self, reporter: &UserId) -> Result<Vec<Issue>, IssuePersistenceError>;

    /// Atomically add `user` to the upvoters of `id`, or remove them if
    /// present. Returns the updated issue, or `None` when it does not exist.
    ///
    /// `at` stamps a new upvote; `updated_at` is left untouched.
    async fn toggle_upvote(
        &self,
        id: &IssueId,
        user: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError>;

    /// Overwrite the status and bump `updated_at`.
    async fn set_status(
        &self,
        id: &IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError>;

    /// Append a comment and bump `updated_at`.
    async fn append_comment(
        &self,
        id: &IssueId,
        comment: &Comment,
    ) -> Result<Option<Issue>, IssuePersistenceError>;

    /// Remove the issue and everything it owns. Returns whether a row existed.
    async fn delete(&self, id: &IssueId) -> Result<bool, IssuePersistenceError>;

    /// Cheap connectivity probe used by readiness checks.
    async fn ping(&self) -> Result<(), IssuePersistenceError>;
}
