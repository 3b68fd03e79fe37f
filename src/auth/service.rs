/// Authentication flows
///
/// Composes the credential store, password hasher, token issuer and refresh
/// coordinator into the register / login / refresh operations. Each call is
/// one bounded computation plus its store round-trips; concurrent refreshes
/// of the same account resolve last-write-wins in the store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::claims::Claims;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{
    generate_refresh_token, rotate_refresh_token, validate_refresh_token, RefreshCookies,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::{Account, CredentialStore};

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Public view of a newly registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredAccount {
    pub username: String,
}

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub access_token: String,
    pub cookies: RefreshCookies,
}

/// Identity carried by a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub role: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: Arc<JwtSettings>,
    generic_login_errors: bool,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: Arc<JwtSettings>) -> Self {
        Self {
            store,
            jwt,
            generic_login_errors: false,
        }
    }

    /// Report both login failures as `InvalidCredentials`
    pub fn with_generic_login_errors(mut self, enabled: bool) -> Self {
        self.generic_login_errors = enabled;
        self
    }

    /// Shared handle on the signing settings, for the bearer middleware
    pub fn jwt_settings(&self) -> Arc<JwtSettings> {
        Arc::clone(&self.jwt)
    }

    /// Create an account with no refresh state
    ///
    /// # Errors
    /// - `Validation` for an empty or oversized username/password
    /// - `UsernameTaken` if the username exists
    #[tracing::instrument(name = "Registering account", skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisteredAccount, AppError> {
        let username = validate_username(username)?;
        validate_password(password)?;

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken.into());
        }

        let digest = hash_password(password)?;
        let account = Account::new(username, digest.hash, digest.salt);
        // A concurrent registration of the same name is caught by the store.
        self.store.insert(&account).await?;

        tracing::info!(username = %account.username, "Account registered");
        Ok(RegisteredAccount {
            username: account.username,
        })
    }

    /// Verify credentials, issue an access token, rotate the refresh token
    ///
    /// # Errors
    /// - `UnknownUser` / `BadCredentials` (or `InvalidCredentials` for both
    ///   when generic login errors are enabled)
    /// - store failures while persisting the refresh token
    #[tracing::instrument(name = "Logging in", skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionGrant, AppError> {
        let username = normalize_username(username);
        let Some(mut account) = self.store.find_by_username(username).await? else {
            return Err(self.login_failure(AuthError::UnknownUser));
        };

        if !verify_password(password, &account.password_hash, &account.password_salt) {
            return Err(self.login_failure(AuthError::BadCredentials));
        }

        let grant = self.issue_session(&mut account).await?;
        tracing::info!(username = %account.username, "Login succeeded");
        Ok(grant)
    }

    /// Exchange a refresh token for a new access token and refresh token
    ///
    /// The presented token is consumed: on success it is replaced in the
    /// store and cannot be used again.
    ///
    /// # Errors
    /// - `UnknownUser` if the account does not exist
    /// - `InvalidToken` / `Expired` from refresh token validation
    #[tracing::instrument(name = "Refreshing session", skip(self, presented_token))]
    pub async fn refresh(
        &self,
        username: &str,
        presented_token: &str,
    ) -> Result<SessionGrant, AppError> {
        let username = normalize_username(username);
        let Some(mut account) = self.store.find_by_username(username).await? else {
            return Err(AuthError::UnknownUser.into());
        };

        validate_refresh_token(&account, presented_token, Utc::now())?;

        let grant = self.issue_session(&mut account).await?;
        tracing::info!(username = %account.username, "Session refreshed");
        Ok(grant)
    }

    /// Name and role of the bearer of a verified access token
    pub fn current_identity(&self, claims: &Claims) -> Identity {
        Identity {
            name: claims.name.clone(),
            role: claims.role.clone(),
        }
    }

    async fn issue_session(&self, account: &mut Account) -> Result<SessionGrant, AppError> {
        let access_token = generate_access_token(&account.username, &self.jwt)?;
        let refresh_token = generate_refresh_token(
            Utc::now(),
            Duration::seconds(self.jwt.refresh_token_expiry),
        );
        let cookies = rotate_refresh_token(self.store.as_ref(), account, refresh_token).await?;

        Ok(SessionGrant {
            access_token,
            cookies,
        })
    }

    fn login_failure(&self, kind: AuthError) -> AppError {
        if self.generic_login_errors {
            AuthError::InvalidCredentials.into()
        } else {
            kind.into()
        }
    }
}

/// Canonical lookup key: accounts are stored under the trimmed name.
fn normalize_username(username: &str) -> &str {
    username.trim()
}

fn validate_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = normalize_username(username);
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }
    Ok(())
}
