use std::time::Duration;

use menuboard_content::config::{ContentConfig, DEFAULT_API_VERSION, DEFAULT_DATASET};
use menuboard_content::reconnect::ReconnectConfig;
use menuboard_core::model::{DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use validator::Validate;

use crate::controller::ControllerConfig;
use crate::sync::SyncConfig;

/// Player configuration loaded from environment variables.
#[derive(Debug, Clone, Validate)]
pub struct PlayerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins for the rendering layer.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    #[validate(length(min = 1, message = "CONTENT_PROJECT_ID must not be empty"))]
    pub project_id: String,
    #[validate(length(min = 1))]
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    pub api_host: Option<String>,
    /// Quiet period after a change notification before re-fetching.
    #[validate(range(min = 50, max = 10_000))]
    pub refetch_debounce_ms: u64,
    /// Auto-return timeout used until kiosk settings provide one.
    #[validate(range(min = 5, max = 300))]
    pub default_timeout_secs: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl PlayerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `CONTENT_PROJECT_ID`   | required                 |
    /// | `CONTENT_DATASET`      | `production`             |
    /// | `CONTENT_API_VERSION`  | `2023-05-03`             |
    /// | `CONTENT_TOKEN`        | none (anonymous)         |
    /// | `CONTENT_API_HOST`     | project API host         |
    /// | `REFETCH_DEBOUNCE_MS`  | `500`                    |
    /// | `DEFAULT_TIMEOUT_SECS` | `30`                     |
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `3000`                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let project_id = var("CONTENT_PROJECT_ID").ok_or(ConfigError::Missing("CONTENT_PROJECT_ID"))?;

        let config = Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&var, "PORT", 3000)?,
            cors_origins: var("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:5173".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            request_timeout_secs: parse(&var, "REQUEST_TIMEOUT_SECS", 30)?,
            project_id,
            dataset: var("CONTENT_DATASET").unwrap_or_else(|| DEFAULT_DATASET.into()),
            api_version: var("CONTENT_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.into()),
            token: var("CONTENT_TOKEN"),
            api_host: var("CONTENT_API_HOST"),
            refetch_debounce_ms: parse(&var, "REFETCH_DEBOUNCE_MS", 500)?,
            default_timeout_secs: parse(&var, "DEFAULT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn content_config(&self) -> ContentConfig {
        ContentConfig {
            project_id: self.project_id.clone(),
            dataset: self.dataset.clone(),
            api_version: self.api_version.clone(),
            token: self.token.clone(),
            api_host: self.api_host.clone(),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            debounce: Duration::from_millis(self.refetch_debounce_ms),
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            default_timeout_secs: self
                .default_timeout_secs
                .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        }
    }
}

fn parse<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var: key, value }),
    }
}
