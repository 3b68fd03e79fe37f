/// Authentication Routes
///
/// HTTP side of the authentication flows: JSON bodies in, JSON envelopes
/// out, refresh state carried in HttpOnly cookies.

use actix_web::cookie::{time::OffsetDateTime, Cookie};
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

use crate::auth::{
    AuthService, Claims, SessionCookie, SessionGrant, REFRESH_TOKEN_COOKIE, USERNAME_COOKIE,
};
use crate::error::{AppError, AuthError};

/// Registration and login request body
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Success envelope shared by every auth endpoint
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub success: bool,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            success: true,
            message: message.into(),
        }
    }
}

fn to_http_cookie(cookie: SessionCookie) -> Result<Cookie<'static>, AppError> {
    let expires = OffsetDateTime::from_unix_timestamp(cookie.expires_at.timestamp())
        .map_err(|e| AppError::Internal(format!("Cookie expiry out of range: {}", e)))?;

    Ok(Cookie::build(cookie.name, cookie.value)
        .http_only(cookie.http_only)
        .path(cookie.path)
        .expires(expires)
        .finish())
}

fn session_response(
    mut builder: HttpResponseBuilder,
    grant: SessionGrant,
    message: &str,
) -> Result<HttpResponse, AppError> {
    for cookie in grant.cookies.cookies() {
        builder.cookie(to_http_cookie(cookie)?);
    }
    Ok(builder.json(ApiResponse::ok(grant.access_token, message)))
}

/// POST /auth/register
///
/// # Errors
/// - 400: empty or oversized username/password
/// - 409: username already exists
pub async fn register(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let account = auth.register(&form.username, &form.password).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(account, "Register successfully")))
}

/// POST /auth/login
///
/// Returns the access token in the body and sets the `username` and
/// `refreshToken` cookies.
///
/// # Errors
/// - 401: unknown username or wrong password
pub async fn login(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let grant = auth.login(&form.username, &form.password).await?;

    session_response(HttpResponse::Ok(), grant, "Login successfully")
}

/// POST /auth/refresh-token
///
/// Reads the `username` and `refreshToken` cookies, rotates the refresh
/// token and returns a new access token.
///
/// # Errors
/// - 401: missing cookies, unknown user, invalid or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let (Some(username), Some(refresh_token)) =
        (req.cookie(USERNAME_COOKIE), req.cookie(REFRESH_TOKEN_COOKIE))
    else {
        return Err(AuthError::InvalidToken.into());
    };

    let grant = auth.refresh(username.value(), refresh_token.value()).await?;

    session_response(HttpResponse::Ok(), grant, "Token refreshed")
}

/// GET /auth/me
///
/// Name and role of the bearer. Requires `Authorization: Bearer <token>`;
/// claims are injected by the JWT middleware.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    auth: web::Data<AuthService>,
) -> HttpResponse {
    let identity = auth.current_identity(&claims);

    HttpResponse::Ok().json(ApiResponse::ok(identity, "Current user"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_http_cookie_attributes() {
        let expires_at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        let cookie = to_http_cookie(SessionCookie {
            name: REFRESH_TOKEN_COOKIE,
            value: "abc".to_string(),
            http_only: true,
            path: "/",
            expires_at,
        })
        .expect("valid cookie");

        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(1_800_000_000)
        );
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok("token", "Login successfully"))
            .expect("serializable");

        assert_eq!(body["data"], "token");
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Login successfully");
    }

    #[test]
    fn test_base64_token_survives_cookie_roundtrip() {
        let value = "ab+/cd==".to_string();
        let cookie = to_http_cookie(SessionCookie {
            name: REFRESH_TOKEN_COOKIE,
            value: value.clone(),
            http_only: true,
            path: "/",
            expires_at: Utc::now() + Duration::days(7),
        })
        .expect("valid cookie");

        let parsed = Cookie::parse(cookie.to_string()).expect("parsable");
        assert_eq!(parsed.value(), value);
    }
}
