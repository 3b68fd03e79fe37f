use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{Account, CredentialStore};
use crate::auth::RefreshToken;
use crate::error::{AppError, DatabaseError};

type AccountRow = (
    String,
    Vec<u8>,
    Vec<u8>,
    Option<String>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

/// Postgres-backed credential store over the `accounts` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn account_from_row(row: AccountRow) -> Account {
    let (username, password_hash, password_salt, token, issued_at, expires_at) = row;
    // The table's CHECK constraint keeps the three columns in lockstep.
    let refresh = match (token, issued_at, expires_at) {
        (Some(token), Some(issued_at), Some(expires_at)) => Some(RefreshToken {
            token,
            issued_at,
            expires_at,
        }),
        _ => None,
    };
    Account {
        username,
        password_hash,
        password_salt,
        refresh,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT username, password_hash, password_salt,
                   refresh_token, refresh_issued_at, refresh_expires_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(account_from_row))
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let refresh = account.refresh.as_ref();
        sqlx::query(
            r#"
            INSERT INTO accounts (
                username, password_hash, password_salt,
                refresh_token, refresh_issued_at, refresh_expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.password_salt)
        .bind(refresh.map(|r| r.token.clone()))
        .bind(refresh.map(|r| r.issued_at))
        .bind(refresh.map(|r| r.expires_at))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), AppError> {
        let refresh = account.refresh.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                password_salt = $3,
                refresh_token = $4,
                refresh_issued_at = $5,
                refresh_expires_at = $6
            WHERE username = $1
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.password_salt)
        .bind(refresh.map(|r| r.token.clone()))
        .bind(refresh.map(|r| r.issued_at))
        .bind(refresh.map(|r| r.expires_at))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "account {} does not exist",
                account.username
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_row_with_refresh_state() {
        let now = Utc::now();
        let row: AccountRow = (
            "alice".to_string(),
            vec![1],
            vec![2],
            Some("token".to_string()),
            Some(now),
            Some(now + Duration::days(7)),
        );
        let account = account_from_row(row);
        let refresh = account.refresh.expect("refresh state");
        assert_eq!(refresh.token, "token");
        assert_eq!(refresh.expires_at - refresh.issued_at, Duration::days(7));
    }

    #[test]
    fn test_row_without_refresh_state() {
        let row: AccountRow = ("bob".to_string(), vec![1], vec![2], None, None, None);
        assert!(account_from_row(row).refresh.is_none());
    }
}
