//! Shared test doubles for unit tests in `src/`.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{EmailAddress, Role, User, UserId, UserName};

/// Fixed instant used as "now" across service tests.
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Build a user with the given role.
pub fn user_with_role(name: &str, email: &str, role: Role) -> User {
    User::new(
        UserId::random(),
        UserName::new(name).expect("fixture name"),
        EmailAddress::new(email).expect("fixture email"),
        role,
        fixture_timestamp(),
    )
}

pub fn citizen() -> User {
    user_with_role("Alice", "alice@example.com", Role::User)
}

pub fn admin() -> User {
    user_with_role("Ada Admin", "admin@example.com", Role::Admin)
}
