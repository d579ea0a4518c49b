use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

/// Distinguishes runtime behavior for different stages of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the marketplace client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub telemetry: TelemetryConfig,
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("CREWBOARD_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let raw_url = env::var("CREWBOARD_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
        let base_url = ApiConfig::parse_base_url(&raw_url)?;

        let token = env::var("CREWBOARD_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let page_size = env::var("CREWBOARD_PAGE_SIZE")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or(ConfigError::InvalidPageSize)?;

        let stale_secs = env::var("CREWBOARD_STALE_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidStaleTime)?;

        let log_level = env::var("CREWBOARD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api: ApiConfig { base_url, token },
            sync: SyncConfig {
                page_size,
                stale_time: Duration::from_secs(stale_secs),
                ..SyncConfig::default()
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the backend lives and how requests authenticate.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

impl ApiConfig {
    /// Parse a base URL, normalizing it to end in `/` so relative joins keep the path prefix.
    pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
        let trimmed = raw.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };

        let url = Url::parse(&normalized).map_err(|source| ConfigError::InvalidApiUrl {
            value: raw.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::UnsupportedScheme {
                value: raw.to_string(),
            }),
        }
    }
}

/// Cache freshness, polling cadence, and page sizing for the sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub page_size: u32,
    pub stale_time: Duration,
    pub conversations_poll: Duration,
    pub messages_poll: Duration,
    pub unread_poll: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            stale_time: Duration::from_secs(10),
            conversations_poll: Duration::from_secs(15),
            messages_poll: Duration::from_secs(5),
            unread_poll: Duration::from_secs(30),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidApiUrl {
        value: String,
        source: url::ParseError,
    },
    UnsupportedScheme {
        value: String,
    },
    InvalidPageSize,
    InvalidStaleTime,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidApiUrl { value, .. } => {
                write!(f, "CREWBOARD_API_URL '{}' is not a valid URL", value)
            }
            ConfigError::UnsupportedScheme { value } => {
                write!(f, "CREWBOARD_API_URL '{}' must use http or https", value)
            }
            ConfigError::InvalidPageSize => {
                write!(f, "CREWBOARD_PAGE_SIZE must be a positive integer")
            }
            ConfigError::InvalidStaleTime => {
                write!(f, "CREWBOARD_STALE_SECS must be a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidApiUrl { source, .. } => Some(source),
            ConfigError::UnsupportedScheme { .. }
            | ConfigError::InvalidPageSize
            | ConfigError::InvalidStaleTime => None,
        }
    }
}
