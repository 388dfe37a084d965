//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and error detail exposure.

pub mod error_detail;
pub mod trace;

pub use error_detail::{ErrorDetail, internal_detail_exposed};
pub use trace::Trace;
