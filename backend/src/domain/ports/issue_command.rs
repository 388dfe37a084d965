//! Driving port for issue mutations.

use async_trait::async_trait;

use crate::domain::{CommentText, Error, IssueId, IssueStatus, IssueView, NewIssue, User};

/// Mutating issue use-cases. Every call names the authenticated actor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueCommand: Send + Sync {
    /// Upload the submission's photos and persist a new issue.
    async fn create_issue(&self, actor: &User, submission: NewIssue) -> Result<IssueView, Error>;

    /// Add or remove the actor's upvote.
    async fn toggle_upvote(&self, actor: &User, id: &IssueId) -> Result<IssueView, Error>;

    /// Overwrite the status.
    async fn update_status(
        &self,
        actor: &User,
        id: &IssueId,
        status: IssueStatus,
    ) -> Result<IssueView, Error>;

    /// Append a comment written by the actor.
    async fn add_comment(
        &self,
        actor: &User,
        id: &IssueId,
        text: CommentText,
    ) -> Result<IssueView, Error>;

    /// Remove an issue and its photos. Admin only.
    async fn delete_issue(&self, actor: &User, id: &IssueId) -> Result<(), Error>;
}
