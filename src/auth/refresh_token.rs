/// Refresh Token Management
///
/// Refresh tokens are:
/// - 64 bytes from the OS CSPRNG, base64 encoded
/// - Stored as the single active token of an account (no history)
/// - Single-use: every successful validation must be followed by a rotation
///
/// Rotation persists the new token and only then hands back the cookies
/// the transport layer has to set.

use chrono::{DateTime, Duration, Utc};
use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{AppError, AuthError};
use crate::store::{Account, CredentialStore};

/// Raw token length in bytes before encoding
pub const REFRESH_TOKEN_BYTES: usize = 64;

pub const USERNAME_COOKIE: &str = "username";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// A refresh token together with its validity window
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshToken")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One cookie the transport layer must set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
    pub http_only: bool,
    pub path: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Cookies produced by a rotation
///
/// Both cookies expire together with the refresh token they carry.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshCookies {
    pub username: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshCookies {
    pub fn cookies(&self) -> [SessionCookie; 2] {
        [
            self.cookie(USERNAME_COOKIE, self.username.clone()),
            self.cookie(REFRESH_TOKEN_COOKIE, self.refresh_token.clone()),
        ]
    }

    fn cookie(&self, name: &'static str, value: String) -> SessionCookie {
        SessionCookie {
            name,
            value,
            http_only: true,
            path: "/",
            expires_at: self.expires_at,
        }
    }
}

impl std::fmt::Debug for RefreshCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCookies")
            .field("username", &self.username)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Generate a new cryptographically secure refresh token
///
/// # Arguments
/// * `now` - Issuance instant
/// * `lifetime` - Validity window starting at `now`
pub fn generate_refresh_token(now: DateTime<Utc>, lifetime: Duration) -> RefreshToken {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    RefreshToken {
        token: Base64::encode_string(&bytes),
        issued_at: now,
        expires_at: now + lifetime,
    }
}

/// Compare two tokens without leaking the position of the first mismatch
///
/// Both values are MACed under a one-off random key and the tags are
/// compared with `verify_slice`, which runs in constant time.
fn tokens_match(stored: &str, presented: &str) -> bool {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);

    let (Ok(mut expected), Ok(mut actual)) = (
        Hmac::<Sha256>::new_from_slice(&key),
        Hmac::<Sha256>::new_from_slice(&key),
    ) else {
        return false;
    };
    expected.update(stored.as_bytes());
    actual.update(presented.as_bytes());

    let tag = expected.finalize().into_bytes();
    actual.verify_slice(&tag).is_ok()
}

/// Validate a presented refresh token against the account's stored one
///
/// Checks, in order:
/// 1. The account has a stored token
/// 2. The presented token equals it
/// 3. The stored token has not expired
///
/// # Errors
/// `InvalidToken` for 1 and 2, `Expired` for 3
pub fn validate_refresh_token(
    account: &Account,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let Some(stored) = account.refresh.as_ref() else {
        tracing::warn!(username = %account.username, "No refresh token stored for account");
        return Err(AuthError::InvalidToken);
    };

    if !tokens_match(&stored.token, presented) {
        tracing::warn!(username = %account.username, "Refresh token mismatch");
        return Err(AuthError::InvalidToken);
    }

    if stored.is_expired_at(now) {
        tracing::info!(username = %account.username, "Refresh token expired");
        return Err(AuthError::Expired);
    }

    Ok(())
}

/// Store a new refresh token on the account and produce its cookies
///
/// The store update is awaited before returning, so a successful result
/// means the new token is durable.
///
/// # Errors
/// Returns error if the store update fails; `account` is left unchanged
pub async fn rotate_refresh_token(
    store: &dyn CredentialStore,
    account: &mut Account,
    token: RefreshToken,
) -> Result<RefreshCookies, AppError> {
    let mut updated = account.clone();
    updated.refresh = Some(token.clone());

    store.update(&updated).await?;
    *account = updated;

    tracing::debug!(
        username = %account.username,
        expires_at = %token.expires_at,
        "Refresh token rotated"
    );

    Ok(RefreshCookies {
        username: account.username.clone(),
        refresh_token: token.token,
        expires_at: token.expires_at,
    })
}
