//! In-memory [`UserRepository`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, User, UserAccount, UserId};

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<UserId, UserAccount>,
    by_email: HashMap<String, UserId>,
}

/// User store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    accounts: Mutex<Accounts>,
}

impl MemoryUserRepository {
    /// An empty store with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> Result<MutexGuard<'_, Accounts>, UserPersistenceError> {
        self.accounts
            .lock()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }
}

fn sorted_by_creation(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    users
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut accounts = self.accounts()?;
        let email = account.user.email().as_ref().to_owned();
        if accounts.by_email.contains_key(&email) {
            return Err(UserPersistenceError::duplicate_email(email));
        }
        let id = *account.user.id();
        accounts.by_email.insert(email, id);
        accounts.by_id.insert(id, account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .accounts()?
            .by_id
            .get(id)
            .map(|account| account.user.clone()))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let accounts = self.accounts()?;
        Ok(accounts
            .by_email
            .get(email.as_ref())
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let accounts = self.accounts()?;
        let found = ids
            .iter()
            .filter_map(|id| accounts.by_id.get(id))
            .map(|account| account.user.clone())
            .collect();
        Ok(found)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let users = self
            .accounts()?
            .by_id
            .values()
            .map(|account| account.user.clone())
            .collect();
        Ok(sorted_by_creation(users))
    }
}
