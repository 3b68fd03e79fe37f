/// JWT Claims structure
///
/// Payload of an access token: the account name, its role, and the
/// standard `iat`/`exp` timestamps (RFC 7519, Unix seconds).

use serde::{Deserialize, Serialize};

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Display name (username)
    pub name: String,
    /// Role granted to the bearer
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `username`, valid for `expiry_seconds` from `issued_at`
    pub fn new(username: &str, role: &str, issued_at: i64, expiry_seconds: i64) -> Self {
        Self {
            sub: username.to_string(),
            name: username.to_string(),
            role: role.to_string(),
            iat: issued_at,
            exp: issued_at + expiry_seconds,
        }
    }
}
