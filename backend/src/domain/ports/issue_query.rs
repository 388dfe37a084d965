//! Driving port for issue reads.

use async_trait::async_trait;

use crate::domain::{Error, IssueId, IssueStatistics, IssueView, StatsPeriod, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueQuery: Send + Sync {
    /// Every issue, newest first.
    async fn list_issues(&self) -> Result<Vec<IssueView>, Error>;

    /// One issue by id.
    async fn get_issue(&self, id: &IssueId) -> Result<IssueView, Error>;

    /// Issues reported by `reporter`, newest first.
    async fn list_reported_by(&self, reporter: &UserId) -> Result<Vec<IssueView>, Error>;

    /// Dashboard statistics over issues created within `period`. Admin only.
    async fn statistics(
        &self,
        actor: &User,
        period: StatsPeriod,
    ) -> Result<IssueStatistics, Error>;

    /// Whether the backing store answers.
    async fn store_ready(&self) -> bool;
}
