//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod auth;
pub mod bearer;
pub mod error;
pub mod health;
pub mod issues;
pub mod multipart;
pub mod router;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_config;
pub mod uploads;
pub mod users;

pub use error::ApiResult;
