//! Middleware controlling whether internal error messages reach clients.
//!
//! Production deployments redact `internal_error` payloads to a generic
//! message. Development deployments wrap the app with
//! `ErrorDetail { expose: true }` so the underlying message is returned.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;

task_local! {
    static EXPOSE_INTERNAL: bool;
}

/// Whether the current request may see internal error messages.
///
/// Returns `false` outside a request wrapped by [`ErrorDetail`].
#[must_use]
pub fn internal_detail_exposed() -> bool {
    EXPOSE_INTERNAL.try_with(|expose| *expose).unwrap_or(false)
}

/// Sets the internal error exposure flag for every request it wraps.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use voiceit::middleware::ErrorDetail;
///
/// let app = App::new().wrap(ErrorDetail { expose: false });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDetail {
    pub expose: bool,
}

impl<S, B> Transform<S, ServiceRequest> for ErrorDetail
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorDetailMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorDetailMiddleware {
            service,
            expose: self.expose,
        }))
    }
}

/// Service wrapper produced by [`ErrorDetail`].
pub struct ErrorDetailMiddleware<S> {
    service: S,
    expose: bool,
}

impl<S, B> Service<ServiceRequest> for ErrorDetailMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);
        Box::pin(EXPOSE_INTERNAL.scope(self.expose, fut))
    }
}
