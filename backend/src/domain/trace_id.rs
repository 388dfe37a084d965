//! Correlation identifier shared by a request's log lines, its `trace-id`
//! response header and any error payload it produces.
//!
//! The active identifier sits in Tokio task-local storage. Spawned tasks do
//! not inherit it; wrap their futures in [`TraceId::scope`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header carrying the identifier, on requests (optional) and responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static ACTIVE: TraceId;
}

/// UUID naming one request.
///
/// # Examples
/// ```
/// use voiceit::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let upstream = TraceId::adopt_or_generate(Some("6f1c2b1e-58c4-4b4e-9a53-0c1f61a0d2aa"));
/// let seen = TraceId::scope(upstream, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(upstream));
/// assert_eq!(upstream.to_string(), "6f1c2b1e-58c4-4b4e-9a53-0c1f61a0d2aa");
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse an identifier supplied by a caller (a proxy or another service)
    /// when it parses as a UUID; otherwise start a new one.
    #[must_use]
    pub fn adopt_or_generate(supplied: Option<&str>) -> Self {
        supplied
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Identifier of the request being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE.try_with(|id| *id).ok()
    }

    /// Run `fut` with `id` as the active identifier.
    pub async fn scope<F: Future>(id: Self, fut: F) -> F::Output {
        ACTIVE.scope(id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}
