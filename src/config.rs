//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cloudflare: CloudflareConfig,
    pub auth: AuthConfig,
    pub oauth: OAuthConfig,
    pub mail: MailConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
    /// Origin allowed by CORS; permissive when unset
    pub allowed_origin: Option<String>,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Storage configuration (Cloudflare R2)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub media: MediaStorageConfig,
}

/// Media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaStorageConfig {
    /// R2 bucket name for posting images
    pub bucket: String,
    /// Public URL for media (Custom Domain)
    /// e.g., "https://media.example.com"
    pub public_url: String,
}

/// Cloudflare credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareConfig {
    /// Cloudflare account ID
    pub account_id: String,
    /// R2 access key ID
    pub r2_access_key_id: String,
    /// R2 secret access key
    pub r2_secret_access_key: String,
}

/// Self-issued token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret for self tokens (32+ bytes)
    pub token_secret: String,
}

/// OAuth provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub kakao: KakaoOAuthConfig,
}

/// Kakao user-info endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KakaoOAuthConfig {
    /// User profile endpoint (default: https://kapi.kakao.com/v2/user/me)
    pub user_info_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Outbound mail configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Send welcome mail on signup
    pub enabled: bool,
    /// Sender address
    pub sender: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (HOMEFEED__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "data/homefeed.db")?
            .set_default(
                "oauth.kakao.user_info_url",
                "https://kapi.kakao.com/v2/user/me",
            )?
            .set_default("oauth.kakao.timeout_seconds", 10)?
            .set_default("mail.enabled", true)?
            .set_default("mail.sender", "no-reply@homefeed.local")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("HOMEFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.token_secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.token_secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.oauth.kakao.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "oauth.kakao.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.oauth.kakao.user_info_url).map_err(|e| {
            crate::error::AppError::Config(format!("oauth.kakao.user_info_url is invalid: {e}"))
        })?;

        if url::Url::parse(&self.storage.media.public_url).is_err() {
            return Err(crate::error::AppError::Config(
                "storage.media.public_url must be an absolute URL".to_string(),
            ));
        }

        Ok(())
    }
}
