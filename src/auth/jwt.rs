/// JWT Token Generation and Validation
///
/// Access tokens are compact `header.payload.signature` JWTs signed with
/// HS512 under the configured server secret.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Signing algorithm for every access token
pub const ALGORITHM: Algorithm = Algorithm::HS512;

/// Generate a new access token for an account
///
/// # Arguments
/// * `username` - Account name, carried as `sub` and `name`
/// * `config` - JWT configuration settings (secret, lifetime, role)
///
/// # Errors
/// Returns error if token encoding fails
pub fn generate_access_token(username: &str, config: &JwtSettings) -> Result<String, AppError> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims::new(username, &config.role, issued_at, config.access_token_expiry);

    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(config.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate and extract claims from an access token
///
/// A token is valid iff its HS512 signature matches under the configured
/// secret and its `exp` lies in the future. Nothing else is checked.
///
/// # Errors
/// Returns `Expired` for a correctly signed but stale token and
/// `InvalidToken` for anything else
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Auth(AuthError::Expired),
            _ => AppError::Auth(AuthError::InvalidToken),
        }
    })
}
