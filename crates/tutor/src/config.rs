use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tutor_api::TutorApiConfig;

use crate::persona::{resolve_system_instructions, SYSTEM_INSTRUCTIONS_ENV_VAR};

pub const CONFIG_PATH_ENV_VAR: &str = "TUTOR_CONFIG_PATH";
pub const API_KEY_ENV_VAR: &str = "TUTOR_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "TUTOR_BASE_URL";
pub const MODEL_ENV_VAR: &str = "TUTOR_MODEL";
pub const DATA_DIR_ENV_VAR: &str = "TUTOR_DATA_DIR";
pub const RELAY_ENV_VAR: &str = "TUTOR_RELAY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine a config directory; set TUTOR_CONFIG_PATH")]
    NoConfigDir,

    #[error("timeout_sec must be > 0")]
    ZeroTimeout,

    #[error("unsupported relay '{0}'; expected 'http' or 'mock'")]
    UnknownRelay(String),

    #[error("the http relay needs an API key; set api_key or TUTOR_API_KEY")]
    MissingApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayKind {
    Http,
    Mock,
}

impl RelayKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownRelay(other.to_owned())),
        }
    }
}

/// User configuration, loaded from JSON and overlaid with `TUTOR_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TutorConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub timeout_sec: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub relay: Option<RelayKind>,
    pub system_instructions: Option<String>,
}

impl TutorConfig {
    /// Load from the default location and apply process environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match non_blank(std::env::var(CONFIG_PATH_ENV_VAR).ok()) {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        };
        Self::load_from(&path)?.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.timeout_sec == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    /// Overlay non-blank values returned by `lookup` for the `TUTOR_*` keys.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| non_blank(lookup(key));

        if let Some(value) = lookup(API_KEY_ENV_VAR) {
            self.api_key = Some(value);
        }
        if let Some(value) = lookup(BASE_URL_ENV_VAR) {
            self.base_url = Some(value);
        }
        if let Some(value) = lookup(MODEL_ENV_VAR) {
            self.model = Some(value);
        }
        if let Some(value) = lookup(DATA_DIR_ENV_VAR) {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(RELAY_ENV_VAR) {
            self.relay = Some(RelayKind::parse(&value)?);
        }
        if let Some(value) = lookup(SYSTEM_INSTRUCTIONS_ENV_VAR) {
            self.system_instructions = Some(value);
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_sec == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.relay == Some(RelayKind::Http) && self.api_key().is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Explicit relay choice, else HTTP when a key is available.
    #[must_use]
    pub fn resolved_relay(&self) -> RelayKind {
        match self.relay {
            Some(kind) => kind,
            None if self.api_key().is_some() => RelayKind::Http,
            None => RelayKind::Mock,
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(tutor_store::default_data_root)
    }

    #[must_use]
    pub fn system_instructions(&self) -> String {
        resolve_system_instructions(self.system_instructions.as_deref())
    }

    /// Transport settings for the HTTP relay.
    pub fn api_config(&self) -> Result<TutorApiConfig, ConfigError> {
        let api_key = self.api_key().ok_or(ConfigError::MissingApiKey)?;
        let mut config = TutorApiConfig::new(api_key);

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        let temperature = self.temperature.unwrap_or(config.temperature);
        let top_p = self.top_p.unwrap_or(config.top_p);
        config = config.with_sampling(temperature, top_p);
        if let Some(timeout_sec) = self.timeout_sec {
            config = config.with_timeout(Duration::from_secs(timeout_sec));
        }

        Ok(config)
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("tutor").join("config.json"))
        .ok_or(ConfigError::NoConfigDir)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
