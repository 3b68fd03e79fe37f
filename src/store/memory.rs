use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Account, CredentialStore};
use crate::error::{AppError, AuthError, DatabaseError};

/// Process-local account storage
///
/// Used by the test suite and by `database.in_memory = true`. Contents are
/// lost when the process exits.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.read().await.get(username).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.username) {
            return Err(AuthError::UsernameTaken.into());
        }
        accounts.insert(account.username.clone(), account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.username) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!(
                "account {} does not exist",
                account.username
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_refresh_token;
    use chrono::{Duration, Utc};

    fn account(name: &str) -> Account {
        Account::new(name.to_string(), vec![1; 64], vec![2; 128])
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = InMemoryCredentialStore::new();
        store.insert(&account("alice")).await.expect("insert");

        let found = store.find_by_username("alice").await.expect("lookup");
        assert_eq!(found, Some(account("alice")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_is_exact_match() {
        let store = InMemoryCredentialStore::new();
        store.insert(&account("alice")).await.expect("insert");

        assert!(store.find_by_username("Alice").await.expect("lookup").is_none());
        assert!(store.find_by_username("alice ").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryCredentialStore::new();
        store.insert(&account("alice")).await.expect("insert");

        let mut other = account("alice");
        other.password_hash = vec![9; 64];
        let err = store.insert(&other).await.expect_err("duplicate");
        assert_eq!(err.auth_kind(), Some(AuthError::UsernameTaken));

        let stored = store.find_by_username("alice").await.expect("lookup").expect("present");
        assert_eq!(stored.password_hash, vec![1; 64]);
    }

    #[tokio::test]
    async fn test_update_overwrites_refresh_state() {
        let store = InMemoryCredentialStore::new();
        let mut alice = account("alice");
        store.insert(&alice).await.expect("insert");

        alice.refresh = Some(generate_refresh_token(Utc::now(), Duration::days(7)));
        store.update(&alice).await.expect("update");

        let stored = store.find_by_username("alice").await.expect("lookup").expect("present");
        assert_eq!(stored.refresh, alice.refresh);
    }

    #[tokio::test]
    async fn test_update_missing_account_fails() {
        let store = InMemoryCredentialStore::new();
        let result = store.update(&account("ghost")).await;
        assert!(matches!(result, Err(AppError::Database(DatabaseError::NotFound(_)))));
    }
}
