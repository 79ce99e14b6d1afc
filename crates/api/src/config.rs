//! Application configuration

use std::env;

use jsonwebtoken::Algorithm;

/// Application configuration loaded from environment variables
///
/// Built once at startup and handed to the components that need it; nothing
/// reads the environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub public_url: String,
    pub cors_allowed_origins: Vec<String>,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub session_cookie_secure: bool,
    pub check_email_deliverability: bool,

    // Email
    pub resend_api_key: String,
    pub resend_api_url: String,
    pub email_from: String,
    pub app_name: String,

    // Logging
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("SECRET_KEY").map_err(|_| ConfigError::Missing("SECRET_KEY"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "SECRET_KEY must be at least 32 characters",
                    ));
                }
                secret
            },
            jwt_algorithm: parse_algorithm(
                &env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            )?,
            access_token_expire_minutes: {
                let minutes: i64 = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 10080)?;
                if minutes <= 0 {
                    return Err(ConfigError::Invalid("ACCESS_TOKEN_EXPIRE_MINUTES"));
                }
                minutes
            },
            session_cookie_secure: parse_var("SESSION_COOKIE_SECURE", false)?,
            check_email_deliverability: parse_var("CHECK_EMAIL_DELIVERABILITY", true)?,

            // Email
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Tap To Smile <noreply@localhost>".to_string()),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Tap To Smile".to_string()),

            // Logging
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Only HMAC algorithms work with a shared secret
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("Unsupported JWT algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}
