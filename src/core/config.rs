//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::Project;

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Valid configuration keys
pub const VALID_KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the backend (without /api)"),
    ("token", "Bearer token sent with every request"),
    ("timeout_secs", "Request timeout in seconds"),
    (
        "default_format",
        "Default output format (tsv, json, yaml, csv, md, id)",
    ),
];

/// mtrack configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub api_url: Option<String>,

    /// Bearer token
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Default output format
    pub default_format: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no api_url configured. Set it with 'mtrack config set api_url <URL>' or MTRACK_API_URL")]
    MissingApiUrl,

    #[error("unknown configuration key '{0}'. Run 'mtrack config keys' to list valid keys")]
    UnknownKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl Config {
    /// Load configuration, merging in priority order:
    /// defaults, global file, workspace file, environment
    pub fn load_for(project: Option<&Project>) -> Self {
        let project_path = project.map(|p| p.config_path());
        Self::load_layers(
            Self::global_config_path().as_deref(),
            project_path.as_deref(),
            |name| std::env::var(name).ok(),
        )
    }

    fn load_layers(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Config::default();

        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path) {
                config.merge(layer);
            }
        }

        if let Some(url) = env("MTRACK_API_URL") {
            config.api_url = Some(url);
        }
        if let Some(token) = env("MTRACK_TOKEN") {
            config.token = Some(token);
        }
        if let Some(secs) = env("MTRACK_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %secs, "ignoring invalid MTRACK_TIMEOUT_SECS"),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(layer) => layer,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable config: {}", e);
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mtrack")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Backend base URL, required for any remote call
    pub fn api_url(&self) -> Result<&str, ConfigError> {
        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingApiUrl)
    }

    /// Token, treating an empty string as unset
    pub fn token(&self) -> Option<String> {
        self.token.clone().filter(|t| !t.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Display value of one key; the token is masked
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(match key {
            "api_url" => self.api_url.clone(),
            "token" => self.token.as_ref().map(|_| "********".to_string()),
            "timeout_secs" => self.timeout_secs.map(|s| s.to_string()),
            "default_format" => self.default_format.clone(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        })
    }
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(ConfigError::UnknownKey(key.to_string()))
    }
}

/// Set `key` in a parsed config document, typing the value per key
pub fn set_value(root: &mut serde_yml::Value, key: &str, value: &str) -> Result<(), ConfigError> {
    check_key(key)?;

    let typed = if key == "timeout_secs" {
        let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "expected a whole number of seconds".to_string(),
        })?;
        serde_yml::Value::Number(secs.into())
    } else {
        serde_yml::Value::String(value.to_string())
    };

    if !root.is_mapping() {
        *root = serde_yml::Value::Mapping(Default::default());
    }
    if let serde_yml::Value::Mapping(map) = root {
        map.insert(serde_yml::Value::String(key.to_string()), typed);
    }
    Ok(())
}

/// Remove `key` from a parsed config document; false if it was not set
pub fn unset_value(root: &mut serde_yml::Value, key: &str) -> Result<bool, ConfigError> {
    check_key(key)?;
    Ok(match root {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(key.to_string()))
            .is_some(),
        _ => false,
    })
}
