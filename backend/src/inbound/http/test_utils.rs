//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::ports::{MockAuthService, MockIssueCommand, MockIssueQuery};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::test_support::MutableClock;

/// Mock driving ports, configured by each test before building state.
#[derive(Default)]
pub struct TestPorts {
    pub auth: MockAuthService,
    pub issues: MockIssueCommand,
    pub issues_query: MockIssueQuery,
}

/// Build handler state over mocks with the fixture clock.
pub fn test_state(ports: TestPorts) -> HttpState {
    HttpState::new(
        HttpStatePorts {
            auth: Arc::new(ports.auth),
            issues: Arc::new(ports.issues),
            issues_query: Arc::new(ports.issues_query),
        },
        Arc::new(MutableClock::default()),
    )
}

/// State whose token `good` resolves to `user`.
pub fn state_with_user(mut ports: TestPorts, user: crate::domain::User) -> HttpState {
    ports
        .auth
        .expect_authenticate()
        .withf(|token: &str| token == "good")
        .returning(move |_| Ok(user.clone()));
    test_state(ports)
}
