use std::fmt;

use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

const REDACTED: &str = "[redacted]";

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Per-IP rate limiting on AI and auth endpoints (`GIFTWISE_RATE_LIMIT=false` disables)
    pub rate_limit: bool,
    pub gemini: GeminiConfig,
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

// The database URL carries the password and the key is a bearer secret.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &REDACTED)
            .field("database_max_connections", &self.database_max_connections)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit", &self.rate_limit)
            .field("gemini", &self.gemini)
            .finish()
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &REDACTED)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let cors_origins = get("GIFTWISE_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let rate_limit = get("GIFTWISE_RATE_LIMIT")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            database_max_connections,
            port,
            cors_origins,
            rate_limit,
            gemini: GeminiConfig {
                api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
        })
    }
}
