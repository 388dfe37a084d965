//! Aggregate analytics for the admin dashboard.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Issue, IssueCategory, IssueStatus, UserDirectory, UserId};

/// Issues with more upvotes than this count as urgent.
pub const URGENT_UPVOTE_THRESHOLD: usize = 10;
/// Number of reporters listed in the leaderboard.
pub const TOP_REPORTER_LIMIT: usize = 5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reporting window for the statistics, matched against `created_at`.
/// `today` is the current UTC calendar day; `week` and `month` are the last
/// seven and thirty days.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use voiceit::domain::StatsPeriod;
///
/// let now = Utc::now();
/// assert!(StatsPeriod::Week.covers(now - TimeDelta::days(6), now));
/// assert!(!StatsPeriod::Week.covers(now - TimeDelta::days(8), now));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl StatsPeriod {
    /// Whether an issue created at `created_at` falls in the window ending `now`.
    pub fn covers(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Today => created_at.date_naive() == now.date_naive(),
            Self::Week => created_at >= now - TimeDelta::days(7),
            Self::Month => created_at >= now - TimeDelta::days(30),
        }
    }
}

/// Issue counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub reported: usize,
    pub acknowledged: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl StatusCounts {
    fn record(&mut self, status: IssueStatus) {
        match status {
            IssueStatus::Reported => self.reported += 1,
            IssueStatus::Acknowledged => self.acknowledged += 1,
            IssueStatus::InProgress => self.in_progress += 1,
            IssueStatus::Resolved => self.resolved += 1,
        }
    }
}

/// Share of issues in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: IssueCategory,
    pub count: usize,
    /// Rounded percentage of all issues.
    pub percentage: u32,
}

/// Reporter leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReporterCount {
    #[schema(value_type = String)]
    pub id: UserId,
    /// `null` when the reporter no longer exists.
    pub name: Option<String>,
    pub count: usize,
}

/// Dashboard statistics over every stored issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatistics {
    pub total: usize,
    pub by_status: StatusCounts,
    /// One entry per category, in display order, including empty ones.
    pub categories: Vec<CategoryShare>,
    /// Rounded percentage of issues that are resolved.
    pub resolution_rate: u32,
    /// Mean days from creation to last update across resolved issues,
    /// rounded; zero when nothing is resolved.
    pub avg_resolution_days: i64,
    pub urgent_issues: usize,
    pub total_upvotes: usize,
    pub top_reporters: Vec<ReporterCount>,
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    // Counts are far below f64's exact integer range.
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

impl IssueStatistics {
    /// Compute statistics; `users` resolves reporter names.
    pub fn compute(issues: &[Issue], users: &UserDirectory) -> Self {
        let total = issues.len();
        let mut by_status = StatusCounts::default();
        let mut per_category: HashMap<IssueCategory, usize> = HashMap::new();
        let mut per_reporter: HashMap<UserId, usize> = HashMap::new();
        let mut resolution_seconds = 0_i64;

        for issue in issues {
            by_status.record(issue.status());
            *per_category.entry(issue.category()).or_default() += 1;
            *per_reporter.entry(issue.reporter()).or_default() += 1;
            if issue.status() == IssueStatus::Resolved {
                resolution_seconds += (issue.updated_at() - issue.created_at()).num_seconds();
            }
        }

        let categories = IssueCategory::ALL
            .into_iter()
            .map(|category| {
                let count = per_category.get(&category).copied().unwrap_or_default();
                CategoryShare {
                    category,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();

        let avg_resolution_days = if by_status.resolved == 0 {
            0
        } else {
            (resolution_seconds as f64 / by_status.resolved as f64 / SECONDS_PER_DAY).round()
                as i64
        };

        let mut top_reporters: Vec<ReporterCount> = per_reporter
            .into_iter()
            .map(|(id, count)| ReporterCount {
                id,
                name: users.get(&id).map(|user| user.name().to_string()),
                count,
            })
            .collect();
        top_reporters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        top_reporters.truncate(TOP_REPORTER_LIMIT);

        Self {
            total,
            resolution_rate: percentage(by_status.resolved, total),
            by_status,
            categories,
            avg_resolution_days,
            urgent_issues: issues
                .iter()
                .filter(|issue| issue.upvotes() > URGENT_UPVOTE_THRESHOLD)
                .count(),
            total_upvotes: issues.iter().map(Issue::upvotes).sum(),
            top_reporters,
        }
    }
}
