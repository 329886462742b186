use lesson_highlights_engine::HighlightColor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_timeout_secs() -> u64 {
    10
}

/// Where highlights are persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// JSON documents under a local directory
    File { path: PathBuf },
    /// The lesson platform's highlights endpoint
    Http {
        base_url: String,
        /// Environment variable holding the bearer token
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_env: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl StoreConfig {
    /// Bearer token read from the configured environment variable, if any
    pub fn bearer_token(&self) -> Option<String> {
        match self {
            StoreConfig::Http {
                token_env: Some(var),
                ..
            } => std::env::var(var).ok(),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            StoreConfig::Http { timeout_secs, .. } => Duration::from_secs(*timeout_secs),
            StoreConfig::File { .. } => Duration::from_secs(default_timeout_secs()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub user_id: String,
    #[serde(default)]
    pub default_color: HighlightColor,
    pub store: StoreConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in a file store path
        if let StoreConfig::File { path } = &mut config.store {
            *path = Self::expand_path(path).unwrap_or_else(|| path.clone());
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/lesson-highlights");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Default store directory used when no config exists yet
    pub fn default_store_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/lesson-highlights");
        PathBuf::from(data_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
