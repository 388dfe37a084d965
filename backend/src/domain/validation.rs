//! Field-level validation reports.
//!
//! Constructors that accept raw request input collect every failing field
//! into a [`FieldErrors`] report so clients can fix all problems in one
//! round trip. The report converts into an `invalid_request` [`Error`] with a
//! `details.errors` array.

use std::fmt;

use serde::Serialize;
use serde_json::json;

use super::Error;

/// One failing field with a stable machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Request field name as the client sent it.
    pub field: &'static str,
    /// Stable snake_case failure code.
    pub code: &'static str,
    /// Human-readable explanation.
    pub message: String,
}

impl FieldError {
    /// Build a field error.
    pub fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Ordered collection of field failures.
///
/// # Examples
/// ```
/// use voiceit::domain::{ErrorCode, FieldError, FieldErrors};
///
/// let mut errors = FieldErrors::default();
/// errors.push(FieldError::new("email", "invalid_email", "email is invalid"));
/// let error = errors.into_error();
/// assert_eq!(error.code(), ErrorCode::InvalidRequest);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Record a failing field.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Whether no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded failures in insertion order.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether the report mentions `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    /// Return `Ok(value)` when empty, otherwise the report itself.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    /// Convert into the shared `invalid_request` error payload.
    pub fn into_error(self) -> Error {
        let message = match self.0.as_slice() {
            [single] => single.message.clone(),
            _ => "request validation failed".to_owned(),
        };
        Error::invalid_request(message).with_details(json!({ "errors": self.0 }))
    }
}

impl From<FieldError> for FieldErrors {
    fn from(value: FieldError) -> Self {
        Self(vec![value])
    }
}

impl From<FieldErrors> for Error {
    fn from(value: FieldErrors) -> Self {
        value.into_error()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|error| error.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for FieldErrors {}
