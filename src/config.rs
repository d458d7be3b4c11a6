use std::time::Duration;
use url::Url;

pub const BASE_URL_VAR: &str = "EXAM_API_BASE_URL";
pub const TOKEN_VAR: &str = "EXAM_API_TOKEN";
pub const POLL_INTERVAL_VAR: &str = "NOTIFICATION_POLL_INTERVAL_SECS";
pub const TIMEOUT_VAR: &str = "EXAM_API_TIMEOUT_SECS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Client settings for talking to the exam platform API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let mut config = Self::new(&base_url)?;

        config.token = lookup(TOKEN_VAR).filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup(POLL_INTERVAL_VAR) {
            config.poll_interval = parse_seconds(POLL_INTERVAL_VAR, &raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.request_timeout = parse_seconds(TIMEOUT_VAR, &raw)?;
        }

        Ok(config)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: BASE_URL_VAR,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name: BASE_URL_VAR,
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        reason: format!("{:?} is not a whole number of seconds", raw),
    })?;

    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}
