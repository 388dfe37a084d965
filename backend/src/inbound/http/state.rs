//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{AuthService, IssueCommand, IssueQuery};
use crate::outbound::assets::FilesystemAssetHost;

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub auth: Arc<dyn AuthService>,
    pub issues: Arc<dyn IssueCommand>,
    pub issues_query: Arc<dyn IssueQuery>,
}

/// Names of the wired adapters, reported by `/api/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterNames {
    pub store: &'static str,
    pub asset_host: &'static str,
}

impl Default for AdapterNames {
    fn default() -> Self {
        Self {
            store: "memory",
            asset_host: "filesystem",
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub issues: Arc<dyn IssueCommand>,
    pub issues_query: Arc<dyn IssueQuery>,
    pub clock: Arc<dyn Clock>,
    pub adapters: AdapterNames,
    /// Local photo store served under `/uploads`, when configured.
    pub uploads: Option<FilesystemAssetHost>,
}

impl HttpState {
    /// Construct state from the ports and a clock for health timestamps.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    /// use mockable::DefaultClock;
    /// use voiceit::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// # fn build(ports: HttpStatePorts) -> HttpState {
    /// HttpState::new(ports, Arc::new(DefaultClock))
    /// # }
    /// ```
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>) -> Self {
        let HttpStatePorts {
            auth,
            issues,
            issues_query,
        } = ports;
        Self {
            auth,
            issues,
            issues_query,
            clock,
            adapters: AdapterNames::default(),
            uploads: None,
        }
    }

    #[must_use]
    pub fn with_adapters(mut self, adapters: AdapterNames) -> Self {
        self.adapters = adapters;
        self
    }

    #[must_use]
    pub fn with_uploads(mut self, uploads: FilesystemAssetHost) -> Self {
        self.uploads = Some(uploads);
        self
    }
}
