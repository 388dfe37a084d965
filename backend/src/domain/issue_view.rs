//! Read model returned to clients: an [`Issue`] with reporter and comment
//! author summaries resolved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Issue, IssueCategory, IssueId, IssueStatus, Location, User, UserId};

/// Public summary of the user who reported an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReporterSummary {
    #[schema(value_type = String)]
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Public summary of a comment author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    #[schema(value_type = String)]
    pub id: UserId,
    pub name: String,
}

/// Comment as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    /// `null` when the author no longer exists.
    pub user: Option<CommentAuthor>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Issue as rendered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    #[schema(value_type = String)]
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub status: IssueStatus,
    pub location: Location,
    pub images: Vec<String>,
    /// `null` when the reporter no longer exists.
    pub reporter: Option<ReporterSummary>,
    pub upvotes: usize,
    #[schema(value_type = Vec<String>)]
    pub upvoted_by: Vec<UserId>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Users keyed by id, used to resolve summaries.
pub type UserDirectory = HashMap<UserId, User>;

impl IssueView {
    /// Project an issue, resolving user summaries from `users`.
    pub fn project(issue: &Issue, users: &UserDirectory) -> Self {
        let reporter = users.get(&issue.reporter()).map(|user| ReporterSummary {
            id: *user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
        });
        let comments = issue
            .comments()
            .iter()
            .map(|comment| CommentView {
                id: comment.id,
                user: users.get(&comment.author).map(|user| CommentAuthor {
                    id: *user.id(),
                    name: user.name().to_string(),
                }),
                text: comment.text.as_ref().to_owned(),
                created_at: comment.created_at,
            })
            .collect();

        Self {
            id: issue.id(),
            title: issue.title().to_owned(),
            description: issue.description().to_owned(),
            category: issue.category(),
            status: issue.status(),
            location: issue.location().clone(),
            images: issue.images().to_vec(),
            reporter,
            upvotes: issue.upvotes(),
            upvoted_by: issue.upvoted_by().iter().copied().collect(),
            comments,
            created_at: issue.created_at(),
            updated_at: issue.updated_at(),
        }
    }
}

/// Every user id an issue refers to: the reporter and comment authors.
pub fn referenced_users<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Vec<UserId> {
    let mut ids: Vec<UserId> = issues
        .into_iter()
        .flat_map(|issue| {
            std::iter::once(issue.reporter()).chain(issue.comments().iter().map(|c| c.author))
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
