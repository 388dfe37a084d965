//! Startup data: the configured administrator account and the demonstration
//! issues shown on an empty deployment.

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{IssueRepository, PasswordHasher, UserRepository};
use crate::domain::{
    AccountService, Error, Issue, IssueId, IssueStatus, NewIssue, NewIssueParts, Registration,
    Role, User,
};

use super::account_service::map_user_error;
use super::issue_service::map_issue_error;

/// Create the administrator account unless the email is already registered.
///
/// An existing account is left untouched, including its role.
pub async fn ensure_admin<U, H>(
    accounts: &AccountService<U, H>,
    registration: &Registration,
) -> Result<User, Error>
where
    U: UserRepository,
    H: PasswordHasher,
{
    let (user, created) = accounts.ensure_account(registration, Role::Admin).await?;
    if created {
        info!(user_id = %user.id(), email = %user.email(), "administrator account created");
    } else if !user.is_admin() {
        warn!(
            user_id = %user.id(),
            email = %user.email(),
            "administrator email belongs to a non-admin account; role left unchanged"
        );
    } else {
        info!(user_id = %user.id(), "administrator account already present");
    }
    Ok(user)
}

struct SampleIssue {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    status: IssueStatus,
    address: &'static str,
    latitude: &'static str,
    longitude: &'static str,
}

const SAMPLE_ISSUES: [SampleIssue; 3] = [
    SampleIssue {
        title: "Large pothole on Main Street",
        description: "There is a large pothole that needs immediate attention. \
                      It's causing traffic issues and vehicle damage.",
        category: "pothole",
        status: IssueStatus::Reported,
        address: "123 Main Street, City Center",
        latitude: "40.7128",
        longitude: "-74.0060",
    },
    SampleIssue {
        title: "Broken streetlight near park",
        description: "Streetlight has been out for 3 days, making the area unsafe \
                      at night for pedestrians.",
        category: "streetlight",
        status: IssueStatus::InProgress,
        address: "456 Park Avenue, Downtown",
        latitude: "40.7282",
        longitude: "-74.0776",
    },
    SampleIssue {
        title: "Garbage accumulation in alley",
        description: "Trash has been piling up for over a week. Creating bad odor \
                      and attracting pests.",
        category: "garbage",
        status: IssueStatus::Acknowledged,
        address: "789 Oak Lane, Residential Area",
        latitude: "40.7505",
        longitude: "-73.9934",
    },
];

/// Insert the demonstration issues when the issue store is empty.
///
/// The reporter is the first non-admin user, falling back to an admin.
/// Returns the number of issues inserted.
pub async fn seed_sample_issues<I, U>(
    issues: &I,
    users: &U,
    clock: &dyn Clock,
) -> Result<usize, Error>
where
    I: IssueRepository,
    U: UserRepository,
{
    if !issues.list().await.map_err(map_issue_error)?.is_empty() {
        info!(reason = "store not empty", "sample issue seeding skipped");
        return Ok(0);
    }
    let known = users.list().await.map_err(map_user_error)?;
    let Some(reporter) = known
        .iter()
        .find(|user| !user.is_admin())
        .or_else(|| known.first())
    else {
        warn!(reason = "no users", "sample issue seeding skipped");
        return Ok(0);
    };

    let now = clock.utc();
    for sample in &SAMPLE_ISSUES {
        let submission = NewIssue::try_from_parts(
            NewIssueParts {
                title: Some(sample.title),
                description: Some(sample.description),
                category: Some(sample.category),
                address: Some(sample.address),
                latitude: Some(sample.latitude),
                longitude: Some(sample.longitude),
            },
            Vec::new(),
        )
        .map_err(|errors| Error::internal(format!("invalid sample issue: {errors}")))?;
        let mut issue =
            Issue::report(IssueId::random(), submission, Vec::new(), *reporter.id(), now);
        issue.set_status(sample.status, now);
        issues.insert(&issue).await.map_err(map_issue_error)?;
    }
    info!(reporter = %reporter.id(), count = SAMPLE_ISSUES.len(), "sample issues seeded");
    Ok(SAMPLE_ISSUES.len())
}
