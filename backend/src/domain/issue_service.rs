//! Issue domain service implementing the [`IssueCommand`] and [`IssueQuery`]
//! driving ports.
//!
//! Photo uploads happen before the issue is persisted: either every photo is
//! stored and the issue is written with their URLs in upload order, or the
//! call fails with `upload_failed` and any photos that did land are removed.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use mockable::Clock;
use serde::Deserialize;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::domain::account_service::map_user_error;
use crate::domain::ports::{
    AssetHost, IssueCommand, IssuePersistenceError, IssueQuery, IssueRepository, UserRepository,
};
use crate::domain::{
    Comment, CommentText, Error, ImageUpload, Issue, IssueId, IssueStatistics, IssueStatus,
    IssueView, NewIssue, StatsPeriod, UnknownVariant, User, UserDirectory, UserId,
    referenced_users,
};

/// Default deadline for all photo uploads of one submission.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(20);

const ADMIN_REQUIRED: &str = "Admin access required";

/// Who may change an issue's status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusUpdatePolicy {
    /// Any signed-in user.
    #[default]
    AnyAuthenticated,
    /// Administrators only.
    AdminOnly,
}

impl FromStr for StatusUpdatePolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-authenticated" => Ok(Self::AnyAuthenticated),
            "admin-only" => Ok(Self::AdminOnly),
            other => Err(UnknownVariant {
                kind: "status update policy",
                value: other.to_owned(),
            }),
        }
    }
}

pub(crate) fn map_issue_error(error: IssuePersistenceError) -> Error {
    match error {
        IssuePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("issue repository unavailable: {message}"))
        }
        IssuePersistenceError::Query { message } => {
            Error::internal(format!("issue repository error: {message}"))
        }
    }
}

fn issue_not_found(id: &IssueId) -> Error {
    Error::not_found(format!("issue {id} not found"))
}

fn require_admin(actor: &User) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden(ADMIN_REQUIRED))
    }
}

/// Issue use-cases over an issue store, a user store and an asset host.
#[derive(Clone)]
pub struct IssueService<I, U> {
    issues: Arc<I>,
    users: Arc<U>,
    assets: Arc<dyn AssetHost>,
    clock: Arc<dyn Clock>,
    status_policy: StatusUpdatePolicy,
    upload_timeout: Duration,
}

impl<I, U> IssueService<I, U> {
    /// Create a service with the default status policy and upload timeout.
    pub fn new(
        issues: Arc<I>,
        users: Arc<U>,
        assets: Arc<dyn AssetHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            issues,
            users,
            assets,
            clock,
            status_policy: StatusUpdatePolicy::default(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Replace who may change an issue's status.
    pub fn with_status_policy(mut self, status_policy: StatusUpdatePolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    /// Replace the deadline shared by all photo uploads of one submission.
    pub fn with_upload_timeout(mut self, upload_timeout: Duration) -> Self {
        self.upload_timeout = upload_timeout;
        self
    }
}

impl<I, U> IssueService<I, U>
where
    I: IssueRepository,
    U: UserRepository,
{
    async fn directory(&self, ids: &[UserId]) -> Result<UserDirectory, Error> {
        if ids.is_empty() {
            return Ok(UserDirectory::new());
        }
        let users = self.users.find_many(ids).await.map_err(map_user_error)?;
        Ok(users.into_iter().map(|user| (*user.id(), user)).collect())
    }

    async fn project_all(&self, issues: &[Issue]) -> Result<Vec<IssueView>, Error> {
        let directory = self.directory(&referenced_users(issues)).await?;
        Ok(issues
            .iter()
            .map(|issue| IssueView::project(issue, &directory))
            .collect())
    }

    async fn project(&self, issue: &Issue) -> Result<IssueView, Error> {
        let directory = self.directory(&referenced_users([issue])).await?;
        Ok(IssueView::project(issue, &directory))
    }

    /// Upload every photo concurrently under one deadline.
    async fn upload_images(&self, images: &[ImageUpload]) -> Result<Vec<String>, Error> {
        if images.is_empty() {
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + self.upload_timeout;
        let results = join_all(
            images
                .iter()
                .map(|image| timeout_at(deadline, self.assets.store(image))),
        )
        .await;

        let mut urls = Vec::with_capacity(images.len());
        let mut failed = false;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(Ok(asset)) => urls.push(asset.url),
                Ok(Err(error)) => {
                    warn!(index, error = %error, "image upload failed");
                    failed = true;
                }
                Err(_) => {
                    warn!(
                        index,
                        timeout_ms = u64::try_from(self.upload_timeout.as_millis()).unwrap_or(u64::MAX),
                        "image upload timed out"
                    );
                    failed = true;
                }
            }
        }

        if failed {
            self.discard_images(&urls).await;
            return Err(Error::upload_failed("image upload failed"));
        }
        Ok(urls)
    }

    /// Best-effort removal; failures are logged and otherwise ignored.
    async fn discard_images(&self, urls: &[String]) {
        let results = join_all(urls.iter().map(|url| self.assets.remove(url))).await;
        for (url, result) in urls.iter().zip(results) {
            if let Err(error) = result {
                warn!(%url, error = %error, "failed to remove stored image");
            }
        }
    }
}

#[async_trait]
impl<I, U> IssueCommand for IssueService<I, U>
where
    I: IssueRepository,
    U: UserRepository,
{
    async fn create_issue(&self, actor: &User, submission: NewIssue) -> Result<IssueView, Error> {
        let urls = self.upload_images(submission.images()).await?;
        let issue = Issue::report(
            IssueId::random(),
            submission,
            urls.clone(),
            *actor.id(),
            self.clock.utc(),
        );
        if let Err(error) = self.issues.insert(&issue).await {
            self.discard_images(&urls).await;
            return Err(map_issue_error(error));
        }
        info!(
            issue_id = %issue.id(),
            reporter = %actor.id(),
            category = issue.category().as_str(),
            images = urls.len(),
            "issue reported"
        );
        self.project(&issue).await
    }

    async fn toggle_upvote(&self, actor: &User, id: &IssueId) -> Result<IssueView, Error> {
        let issue = self
            .issues
            .toggle_upvote(id, actor.id(), self.clock.utc())
            .await
            .map_err(map_issue_error)?
            .ok_or_else(|| issue_not_found(id))?;
        self.project(&issue).await
    }

    async fn update_status(
        &self,
        actor: &User,
        id: &IssueId,
        status: IssueStatus,
    ) -> Result<IssueView, Error> {
        if self.status_policy == StatusUpdatePolicy::AdminOnly {
            require_admin(actor)?;
        }
        let issue = self
            .issues
            .set_status(id, status, self.clock.utc())
            .await
            .map_err(map_issue_error)?
            .ok_or_else(|| issue_not_found(id))?;
        info!(issue_id = %id, status = status.as_str(), actor = %actor.id(), "issue status updated");
        self.project(&issue).await
    }

    async fn add_comment(
        &self,
        actor: &User,
        id: &IssueId,
        text: CommentText,
    ) -> Result<IssueView, Error> {
        let comment = Comment::new(*actor.id(), text, self.clock.utc());
        let issue = self
            .issues
            .append_comment(id, &comment)
            .await
            .map_err(map_issue_error)?
            .ok_or_else(|| issue_not_found(id))?;
        self.project(&issue).await
    }

    async fn delete_issue(&self, actor: &User, id: &IssueId) -> Result<(), Error> {
        require_admin(actor)?;
        let issue = self
            .issues
            .find_by_id(id)
            .await
            .map_err(map_issue_error)?
            .ok_or_else(|| issue_not_found(id))?;
        self.discard_images(issue.images()).await;
        let removed = self.issues.delete(id).await.map_err(map_issue_error)?;
        if !removed {
            return Err(issue_not_found(id));
        }
        info!(issue_id = %id, actor = %actor.id(), "issue deleted");
        Ok(())
    }
}

#[async_trait]
impl<I, U> IssueQuery for IssueService<I, U>
where
    I: IssueRepository,
    U: UserRepository,
{
    async fn list_issues(&self) -> Result<Vec<IssueView>, Error> {
        let issues = self.issues.list().await.map_err(map_issue_error)?;
        self.project_all(&issues).await
    }

    async fn get_issue(&self, id: &IssueId) -> Result<IssueView, Error> {
        let issue = self
            .issues
            .find_by_id(id)
            .await
            .map_err(map_issue_error)?
            .ok_or_else(|| issue_not_found(id))?;
        self.project(&issue).await
    }

    async fn list_reported_by(&self, reporter: &UserId) -> Result<Vec<IssueView>, Error> {
        let issues = self
            .issues
            .list_by_reporter(reporter)
            .await
            .map_err(map_issue_error)?;
        self.project_all(&issues).await
    }

    async fn statistics(
        &self,
        actor: &User,
        period: StatsPeriod,
    ) -> Result<IssueStatistics, Error> {
        require_admin(actor)?;
        let now = self.clock.utc();
        let issues: Vec<Issue> = self
            .issues
            .list()
            .await
            .map_err(map_issue_error)?
            .into_iter()
            .filter(|issue| period.covers(issue.created_at(), now))
            .collect();
        let users = self.users.list().await.map_err(map_user_error)?;
        let directory: UserDirectory = users.into_iter().map(|user| (*user.id(), user)).collect();
        Ok(IssueStatistics::compute(&issues, &directory))
    }

    async fn store_ready(&self) -> bool {
        match self.issues.ping().await {
            Ok(()) => true,
            Err(error) => {
                warn!(error = %error, "issue store not ready");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "issue_service_tests.rs"]
mod tests;
