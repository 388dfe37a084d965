//! PostgreSQL-backed `IssueRepository` implementation using Diesel ORM.
//!
//! An issue spans four tables: the `issues` row plus its images, upvotes and
//! comments. Reads load the children for a batch of parents with one
//! `issue_id = ANY(...)` query per table and stitch them back
//! into the aggregate. Mutations that touch more than one row run inside a
//! transaction that first locks the parent with `SELECT ... FOR UPDATE`, which
//! serialises concurrent upvote toggles on the same issue without blocking
//! toggles on other issues.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{IssuePersistenceError, IssueRepository};
use crate::domain::{
    Comment, CommentText, Issue, IssueId, IssueRecord, IssueStatus, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    IssueCommentRow, IssueImageRow, IssueRow, IssueUpvoteRow, NewIssueRow, NewIssueUpvoteRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{issue_comments, issue_images, issue_upvotes, issues};

/// Diesel-backed implementation of the `IssueRepository` port.
#[derive(Clone)]
pub struct DieselIssueRepository {
    pool: DbPool,
}

impl DieselIssueRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IssuePersistenceError {
    map_basic_pool_error(error, IssuePersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> IssuePersistenceError {
    map_basic_diesel_error(
        error,
        IssuePersistenceError::query,
        IssuePersistenceError::connection,
    )
}

/// Rows making up one stored issue.
#[derive(Debug)]
struct IssueGraph {
    issue: IssueRow,
    images: Vec<IssueImageRow>,
    upvotes: Vec<IssueUpvoteRow>,
    comments: Vec<IssueCommentRow>,
}

impl IssueGraph {
    fn into_issue(self) -> Result<Issue, IssuePersistenceError> {
        let Self {
            issue,
            mut images,
            upvotes,
            mut comments,
        } = self;
        let invalid = |detail: String| IssuePersistenceError::query(detail);

        let category = issue
            .category
            .parse()
            .map_err(|err| invalid(format!("issue {}: {err}", issue.id)))?;
        let status = issue
            .status
            .parse()
            .map_err(|err| invalid(format!("issue {}: {err}", issue.id)))?;
        let location = issue.location().map_err(invalid)?;

        images.sort_by_key(|image| image.position);
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let comments = comments
            .into_iter()
            .map(|row| {
                let text = CommentText::new(&row.body)
                    .map_err(|err| invalid(format!("comment {}: {err}", row.id)))?;
                Ok(Comment {
                    id: row.id,
                    author: UserId::from_uuid(row.author_id),
                    text,
                    created_at: row.created_at,
                })
            })
            .collect::<Result<Vec<_>, IssuePersistenceError>>()?;

        let upvoted_by: BTreeSet<UserId> = upvotes
            .into_iter()
            .map(|row| UserId::from_uuid(row.user_id))
            .collect();
        if usize::try_from(issue.upvotes).ok() != Some(upvoted_by.len()) {
            debug!(
                issue_id = %issue.id,
                cached = issue.upvotes,
                actual = upvoted_by.len(),
                "upvote cache out of step; using membership rows"
            );
        }

        Ok(Issue::restore(IssueRecord {
            id: IssueId::from_uuid(issue.id),
            title: issue.title,
            description: issue.description,
            category,
            status,
            location,
            images: images.into_iter().map(|image| image.url).collect(),
            reporter: UserId::from_uuid(issue.reporter_id),
            upvoted_by,
            comments,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }))
    }
}

/// Load child rows for `parents` and group them per parent, preserving the
/// order of `parents`.
async fn load_graphs(
    conn: &mut AsyncPgConnection,
    parents: Vec<IssueRow>,
) -> QueryResult<Vec<IssueGraph>> {
    if parents.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = parents.iter().map(|issue| issue.id).collect();
    let images: Vec<IssueImageRow> = issue_images::table
        .filter(issue_images::issue_id.eq_any(&ids))
        .select(IssueImageRow::as_select())
        .load(conn)
        .await?;
    let upvotes: Vec<IssueUpvoteRow> = issue_upvotes::table
        .filter(issue_upvotes::issue_id.eq_any(&ids))
        .select(IssueUpvoteRow::as_select())
        .load(conn)
        .await?;
    let comments: Vec<IssueCommentRow> = issue_comments::table
        .filter(issue_comments::issue_id.eq_any(&ids))
        .select(IssueCommentRow::as_select())
        .load(conn)
        .await?;

    let images = images.grouped_by(&parents);
    let upvotes = upvotes.grouped_by(&parents);
    let comments = comments.grouped_by(&parents);
    Ok(parents
        .into_iter()
        .zip(images)
        .zip(upvotes)
        .zip(comments)
        .map(|(((issue, images), upvotes), comments)| IssueGraph {
            issue,
            images,
            upvotes,
            comments,
        })
        .collect())
}

async fn load_graph(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<IssueGraph>> {
    let parent: Option<IssueRow> = issues::table
        .find(id)
        .select(IssueRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let Some(parent) = parent else {
        return Ok(None);
    };
    Ok(load_graphs(conn, vec![parent]).await?.pop())
}

/// Lock the parent row for the rest of the transaction.
async fn lock_issue(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<bool> {
    let locked: Option<Uuid> = issues::table
        .find(id)
        .select(issues::id)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(locked.is_some())
}

fn finish(graph: Option<IssueGraph>) -> Result<Option<Issue>, IssuePersistenceError> {
    graph.map(IssueGraph::into_issue).transpose()
}

fn finish_all(graphs: Vec<IssueGraph>) -> Result<Vec<Issue>, IssuePersistenceError> {
    graphs.into_iter().map(IssueGraph::into_issue).collect()
}

#[async_trait]
impl IssueRepository for DieselIssueRepository {
    async fn insert(&self, issue: &Issue) -> Result<(), IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *issue.id().as_uuid();
        let row = NewIssueRow::from(issue);
        let images: Vec<IssueImageRow> = issue
            .images()
            .iter()
            .enumerate()
            .map(|(position, url)| IssueImageRow {
                issue_id: id,
                position: i16::try_from(position).unwrap_or(i16::MAX),
                url: url.clone(),
            })
            .collect();
        let upvotes: Vec<NewIssueUpvoteRow> = issue
            .upvoted_by()
            .iter()
            .map(|user| NewIssueUpvoteRow {
                issue_id: id,
                user_id: *user.as_uuid(),
                created_at: issue.created_at(),
            })
            .collect();
        let comments: Vec<IssueCommentRow> = issue
            .comments()
            .iter()
            .map(|comment| IssueCommentRow {
                id: comment.id,
                issue_id: id,
                author_id: *comment.author.as_uuid(),
                body: comment.text.as_ref().to_owned(),
                created_at: comment.created_at,
            })
            .collect();

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(issues::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !images.is_empty() {
                    diesel::insert_into(issue_images::table)
                        .values(&images)
                        .execute(conn)
                        .await?;
                }
                if !upvotes.is_empty() {
                    diesel::insert_into(issue_upvotes::table)
                        .values(&upvotes)
                        .execute(conn)
                        .await?;
                }
                if !comments.is_empty() {
                    diesel::insert_into(issue_comments::table)
                        .values(&comments)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &IssueId) -> Result<Option<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let graph = load_graph(&mut conn, *id.as_uuid())
            .await
            .map_err(map_diesel_error)?;
        finish(graph)
    }

    async fn list(&self) -> Result<Vec<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let parents: Vec<IssueRow> = issues::table
            .order((issues::created_at.desc(), issues::id.asc()))
            .select(IssueRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let graphs = load_graphs(&mut conn, parents)
            .await
            .map_err(map_diesel_error)?;
        finish_all(graphs)
    }

    async fn list_by_reporter(&self, reporter: &UserId) -> Result<Vec<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let parents: Vec<IssueRow> = issues::table
            .filter(issues::reporter_id.eq(reporter.as_uuid()))
            .order((issues::created_at.desc(), issues::id.asc()))
            .select(IssueRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let graphs = load_graphs(&mut conn, parents)
            .await
            .map_err(map_diesel_error)?;
        finish_all(graphs)
    }

    async fn toggle_upvote(
        &self,
        id: &IssueId,
        user: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let issue_id = *id.as_uuid();
        let user_id = *user.as_uuid();

        let graph = conn
            .transaction(|conn| {
                async move {
                    if !lock_issue(conn, issue_id).await? {
                        return Ok(None);
                    }
                    let removed = diesel::delete(issue_upvotes::table.find((issue_id, user_id)))
                        .execute(conn)
                        .await?;
                    if removed == 0 {
                        diesel::insert_into(issue_upvotes::table)
                            .values(&NewIssueUpvoteRow {
                                issue_id,
                                user_id,
                                created_at: at,
                            })
                            .execute(conn)
                            .await?;
                    }
                    let count: i64 = issue_upvotes::table
                        .filter(issue_upvotes::issue_id.eq(issue_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    diesel::update(issues::table.find(issue_id))
                        .set(issues::upvotes.eq(i32::try_from(count).unwrap_or(i32::MAX)))
                        .execute(conn)
                        .await?;
                    load_graph(conn, issue_id).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        finish(graph)
    }

    async fn set_status(
        &self,
        id: &IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let issue_id = *id.as_uuid();

        let graph = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(issues::table.find(issue_id))
                        .set((
                            issues::status.eq(status.as_str()),
                            issues::updated_at.eq(at),
                        ))
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Ok(None);
                    }
                    load_graph(conn, issue_id).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        finish(graph)
    }

    async fn append_comment(
        &self,
        id: &IssueId,
        comment: &Comment,
    ) -> Result<Option<Issue>, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let issue_id = *id.as_uuid();
        let row = IssueCommentRow {
            id: comment.id,
            issue_id,
            author_id: *comment.author.as_uuid(),
            body: comment.text.as_ref().to_owned(),
            created_at: comment.created_at,
        };

        let graph = conn
            .transaction(|conn| {
                async move {
                    if !lock_issue(conn, issue_id).await? {
                        return Ok(None);
                    }
                    diesel::insert_into(issue_comments::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    diesel::update(issues::table.find(issue_id))
                        .set(issues::updated_at.eq(row.created_at))
                        .execute(conn)
                        .await?;
                    load_graph(conn, issue_id).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        finish(graph)
    }

    async fn delete(&self, id: &IssueId) -> Result<bool, IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(issues::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), IssuePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
