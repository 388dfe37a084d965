//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live here so
//! the repositories stay thin.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Coordinates, EmailAddress, Issue, Location, PasswordHash, Role, User, UserAccount, UserId,
    UserName,
};

use super::schema::{issue_comments, issue_images, issue_upvotes, issues, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert into the domain user, rejecting rows that violate domain rules.
    pub fn into_user(self) -> Result<User, String> {
        self.into_account().map(|account| account.user)
    }

    pub fn into_account(self) -> Result<UserAccount, String> {
        let name = UserName::new(&self.name).map_err(|err| format!("user {}: {err}", self.id))?;
        let email =
            EmailAddress::new(&self.email).map_err(|err| format!("user {}: {err}", self.id))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|err| format!("user {}: {err}", self.id))?;
        let user = User::new(
            UserId::from_uuid(self.id),
            name,
            email,
            role,
            self.created_at,
        )
        .with_timestamps(self.created_at, self.updated_at);
        Ok(UserAccount {
            user,
            password_hash: PasswordHash::new(self.password_hash),
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UserAccount> for NewUserRow<'a> {
    fn from(account: &'a UserAccount) -> Self {
        let user = &account.user;
        Self {
            id: *user.id().as_uuid(),
            name: user.name().as_ref(),
            email: user.email().as_ref(),
            password_hash: account.password_hash.as_str(),
            role: user.role().as_str(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Row struct for the issues table.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IssueRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reporter_id: Uuid,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new issues. The upvote cache starts at zero.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = issues)]
pub(crate) struct NewIssueRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub status: &'a str,
    pub address: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub reporter_id: Uuid,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Issue> for NewIssueRow<'a> {
    fn from(issue: &'a Issue) -> Self {
        let Location {
            address,
            coordinates,
        } = issue.location();
        Self {
            id: *issue.id().as_uuid(),
            title: issue.title(),
            description: issue.description(),
            category: issue.category().as_str(),
            status: issue.status().as_str(),
            address: address.as_str(),
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
            reporter_id: *issue.reporter().as_uuid(),
            upvotes: i32::try_from(issue.upvotes()).unwrap_or(i32::MAX),
            created_at: issue.created_at(),
            updated_at: issue.updated_at(),
        }
    }
}

impl IssueRow {
    pub fn location(&self) -> Result<Location, String> {
        let coordinates = Coordinates::new(self.latitude, self.longitude)
            .map_err(|errors| format!("issue {}: {errors}", self.id))?;
        Ok(Location {
            address: self.address.clone(),
            coordinates,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Associations)]
#[diesel(belongs_to(IssueRow, foreign_key = issue_id))]
#[diesel(table_name = issue_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IssueImageRow {
    pub issue_id: Uuid,
    pub position: i16,
    pub url: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Associations)]
#[diesel(belongs_to(IssueRow, foreign_key = issue_id))]
#[diesel(table_name = issue_upvotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IssueUpvoteRow {
    pub issue_id: Uuid,
    pub user_id: Uuid,
    #[expect(dead_code, reason = "kept for auditing; ordering uses user ids")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = issue_upvotes)]
pub(crate) struct NewIssueUpvoteRow {
    pub issue_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Associations)]
#[diesel(belongs_to(IssueRow, foreign_key = issue_id))]
#[diesel(table_name = issue_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IssueCommentRow {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
