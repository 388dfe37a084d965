//! Actix rendering of domain [`Error`]s.
//!
//! Status codes come from the error code. `internal_error` messages are
//! replaced with a generic one unless [`ErrorDetail`](crate::middleware::ErrorDetail)
//! exposes them; the original is always logged.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};
use crate::middleware::internal_detail_exposed;

/// Result type returned by every handler.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED: &str = "Internal server error";

const fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UploadFailed | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The body clients see. Redaction keeps the trace id and drops details.
fn client_view(error: &Error, expose_internal: bool) -> Cow<'_, Error> {
    if error.code() != ErrorCode::InternalError || expose_internal {
        return Cow::Borrowed(error);
    }
    let redacted = Error::internal(REDACTED);
    Cow::Owned(match error.trace_id() {
        Some(id) => redacted.with_trace_id(id),
        None => redacted,
    })
}

fn log_server_fault(error: &Error) {
    match error.code() {
        ErrorCode::InternalError => {
            error!(trace_id = ?error.trace_id(), message = %error, "internal error");
        }
        code if code.is_server_fault() => {
            warn!(trace_id = ?error.trace_id(), ?code, message = %error, "dependency failure");
        }
        _ => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_server_fault(self);
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id));
        }
        response.json(client_view(self, internal_detail_exposed()))
    }
}

/// `JsonConfig` whose extractor failures use the error envelope with
/// `invalid_request`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| Error::invalid_request(format!("invalid JSON body: {err}")).into())
}

/// `QueryConfig` counterpart of [`json_config`].
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| Error::invalid_request(format!("invalid query: {err}")).into())
}

#[cfg(test)]
mod tests;
