/// Configuration management for the blog service
///
/// Loads configuration from environment variables with development defaults.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// Session/auth configuration
    pub auth: AuthConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL
    pub url: String,
    /// TTL for the cached site-wide listing page, in seconds
    pub page_ttl_secs: u64,
}

/// Session/auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub session_secret: String,
    /// Session lifetime in days
    pub session_ttl_days: i64,
}

/// Uploaded media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded images are stored under
    pub root: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(value) => value,
            Err(_) if app_env.eq_ignore_ascii_case("production") => {
                return Err("SESSION_SECRET must be set in production".to_string())
            }
            Err(_) => "insecure-dev-session-secret".to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("BLOG_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/blog".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                page_ttl_secs: std::env::var("PAGE_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
            },
            auth: AuthConfig {
                session_secret,
                session_ttl_days: std::env::var("SESSION_TTL_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(14),
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            },
        })
    }
}
