//! In-memory [`IssueRepository`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{IssuePersistenceError, IssueRepository};
use crate::domain::{Comment, Issue, IssueId, IssueStatus, UserId};

/// Issue store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryIssueRepository {
    issues: Mutex<HashMap<IssueId, Issue>>,
}

impl MemoryIssueRepository {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn issues(&self) -> Result<MutexGuard<'_, HashMap<IssueId, Issue>>, IssuePersistenceError> {
        self.issues
            .lock()
            .map_err(|_| IssuePersistenceError::query("issue store lock poisoned"))
    }

    /// Apply `change` to one issue under the store lock.
    fn modify<F>(&self, id: &IssueId, change: F) -> Result<Option<Issue>, IssuePersistenceError>
    where
        F: FnOnce(&mut Issue),
    {
        let mut issues = self.issues()?;
        Ok(issues.get_mut(id).map(|issue| {
            change(issue);
            issue.clone()
        }))
    }
}

fn newest_first(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
    });
    issues
}

#[async_trait]
impl IssueRepository for MemoryIssueRepository {
    async fn insert(&self, issue: &Issue) -> Result<(), IssuePersistenceError> {
        self.issues()?.insert(issue.id(), issue.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &IssueId) -> Result<Option<Issue>, IssuePersistenceError> {
        Ok(self.issues()?.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Issue>, IssuePersistenceError> {
        let all = self.issues()?.values().cloned().collect();
        Ok(newest_first(all))
    }

    async fn list_by_reporter(&self, reporter: &UserId) -> Result<Vec<Issue>, IssuePersistenceError> {
        let mine = self
            .issues()?
            .values()
            .filter(|issue| issue.reporter() == *reporter)
            .cloned()
            .collect();
        Ok(newest_first(mine))
    }

    async fn toggle_upvote(
        &self,
        id: &IssueId,
        user: &UserId,
        _at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        self.modify(id, |issue| {
            issue.toggle_upvote(*user);
        })
    }

    async fn set_status(
        &self,
        id: &IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        self.modify(id, |issue| issue.set_status(status, at))
    }

    async fn append_comment(
        &self,
        id: &IssueId,
        comment: &Comment,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        self.modify(id, |issue| issue.add_comment(comment.clone()))
    }

    async fn delete(&self, id: &IssueId) -> Result<bool, IssuePersistenceError> {
        Ok(self.issues()?.remove(id).is_some())
    }

    async fn ping(&self) -> Result<(), IssuePersistenceError> {
        self.issues().map(|_| ())
    }
}
