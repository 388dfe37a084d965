//! Process-local repositories backed by mutex-guarded maps.
//!
//! Used when no database URL is configured and by the HTTP integration
//! tests. Every mutation completes under a single lock acquisition, so the
//! repositories honour the same atomicity contract as the Diesel adapters.

mod issue_repository;
mod user_repository;

pub use issue_repository::MemoryIssueRepository;
pub use user_repository::MemoryUserRepository;
