use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "AQS_CONFIG";

/// Environment variable that overrides `api_keys.air_quality`
pub const TOKEN_ENV: &str = "WAQI_TOKEN";

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub air_quality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub pool_size: Option<usize>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api_keys: Option<ApiKeysConfig>,
    pub api: Option<ApiConfig>,
    pub sampling: Option<SamplingConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No API token: set api_keys.air_quality in the config file or WAQI_TOKEN")]
    MissingToken,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Otherwise the file named by `AQS_CONFIG`
    /// (or `config.toml`) is read if present, with defaults if not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = std::env::var(CONFIG_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(AppConfig::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str::<AppConfig>(&s)?)
    }

    /// API token, with `WAQI_TOKEN` taking precedence over the file
    pub fn api_token(&self) -> Result<String, ConfigError> {
        self.resolve_token(std::env::var(TOKEN_ENV).ok())
    }

    fn resolve_token(&self, env_token: Option<String>) -> Result<String, ConfigError> {
        env_token
            .or_else(|| {
                self.api_keys
                    .as_ref()
                    .and_then(|k| k.air_quality.clone())
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.api.as_ref().and_then(|a| a.base_url.as_deref())
    }

    /// HTTP timeout (default 30s)
    pub fn timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn pool_size(&self) -> Option<usize> {
        self.sampling.as_ref().and_then(|s| s.pool_size)
    }

    /// Window budget (default 60s)
    pub fn window(&self) -> Duration {
        let secs = self
            .sampling
            .as_ref()
            .and_then(|s| s.window_secs)
            .unwrap_or(DEFAULT_WINDOW_SECS);
        Duration::from_secs(secs)
    }
}
