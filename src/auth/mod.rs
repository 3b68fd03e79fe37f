/// Authentication module
///
/// Password hashing, access token issuance/validation, refresh token
/// rotation, and the flows that compose them.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::Claims;
pub use jwt::generate_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use password::PasswordDigest;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::rotate_refresh_token;
pub use refresh_token::validate_refresh_token;
pub use refresh_token::{RefreshCookies, RefreshToken, SessionCookie};
pub use refresh_token::{REFRESH_TOKEN_COOKIE, USERNAME_COOKIE};
pub use service::{AuthService, Identity, RegisteredAccount, SessionGrant};
