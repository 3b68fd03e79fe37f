/// Credential Store
///
/// Persistence contract for accounts: exact-match lookup by username,
/// insert, and update-by-key. Every write is committed before the call
/// returns; errors are surfaced to the caller and never retried here.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::auth::RefreshToken;
use crate::error::AppError;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// A registered account
///
/// `password_hash` is always the HMAC-SHA-512 of the password keyed with
/// `password_salt`. The refresh triple (token, issued, expires) is either
/// entirely present or entirely absent.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub refresh: Option<RefreshToken>,
}

impl Account {
    /// A freshly registered account with no refresh state
    pub fn new(username: String, password_hash: Vec<u8>, password_salt: Vec<u8>) -> Self {
        Self {
            username,
            password_hash,
            password_salt,
            refresh: None,
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("has_refresh_token", &self.refresh.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    /// Fails with `UsernameTaken` when the username is already present
    async fn insert(&self, account: &Account) -> Result<(), AppError>;

    /// Overwrites the stored row for `account.username`; last write wins
    async fn update(&self, account: &Account) -> Result<(), AppError>;
}
