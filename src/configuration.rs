use secrecy::{ExposeSecret, SecretString};
use serde::Deserializer;

use crate::error::ConfigError;

/// Minimum signing key length in bytes: 512 bits, the HMAC-SHA-512 output size.
pub const MIN_SECRET_BYTES: usize = 64;

#[derive(serde::Deserialize, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Report unknown usernames and wrong passwords with one message
    #[serde(default)]
    pub generic_login_errors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Keep accounts in process memory instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection string, for creating or dropping databases
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token signing and lifetime settings
///
/// Loaded once at startup and shared read-only afterwards. The secret is
/// wrapped in `SecretString` so it never shows up in `Debug` output.
#[derive(serde::Deserialize, Debug)]
pub struct JwtSettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_access_token_expiry() -> i64 {
    24 * 60 * 60
}

fn default_refresh_token_expiry() -> i64 {
    7 * 24 * 60 * 60
}

fn default_role() -> String {
    "Admin".to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}

impl JwtSettings {
    /// Settings with the default lifetimes and role
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            access_token_expiry: default_access_token_expiry(),
            refresh_token_expiry: default_refresh_token_expiry(),
            role: default_role(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret_len = self.secret.expose_secret().len();
        if secret_len == 0 {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if secret_len < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES, secret_len
            )));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.refresh_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read `configuration.{yaml,toml,json}` from the working directory, then
/// apply `APP__SECTION__KEY` environment overrides.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    Ok(settings)
}
