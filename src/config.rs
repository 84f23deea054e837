//! Configuration management for Cached Fetch
//!
//! This module provides TOML configuration with multi-source loading,
//! first-run initialization and zero-config defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CacheConfig, ClientConfig, StoreBackend};
use crate::constants::{config as paths, http, logging};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Cache store settings
    pub cache: CacheConfigToml,
    /// Defaults applied to requests made from the CLI
    pub request: RequestDefaults,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive interval (None = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (None = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Default request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// User agent header
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(http::TCP_KEEPALIVE),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (OS cache directory if unset)
    pub cache_root: Option<PathBuf>,
    /// Store backend: "file" or "memory"
    pub backend: StoreBackend,
}

/// Request defaults for the CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RequestDefaults {
    /// Cache time-to-live in seconds (0 = caching disabled)
    pub ttl_secs: u64,
    /// Headers added to every request
    pub headers: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Show the tracing target in log lines
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LEVEL.to_string(),
            show_target: false,
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Explicit file (argument, then `CACHED_FETCH_CONFIG`)
    /// 3. First file found in the standard locations
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let explicit = config_file_override.or_else(|| {
            std::env::var_os(paths::ENV_CONFIG_PATH)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound { path }.into());
            }
            return Self::load_from_file(&path).await;
        }

        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found in standard locations, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and returns its path
    pub async fn initialize_first_run() -> Result<PathBuf> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            return Ok(config_path);
        }

        info!("Creating default configuration file...");
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        info!("Created default configuration at {}", config_path.display());
        Ok(config_path)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(paths::LOCAL_FILE)];
        if let Ok(path) = Self::default_config_path() {
            search_paths.push(path);
        }
        #[cfg(unix)]
        search_paths.push(PathBuf::from("/etc").join(paths::DIR_NAME).join(paths::FILE_NAME));

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(paths::DIR_NAME).join(paths::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::parse(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).map_err(ConfigError::InvalidFormat)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that TOML types alone cannot constrain
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.client.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "client.request_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }
        if let Some(header) = self.request.headers.iter().find(|h| !h.contains(':')) {
            return Err(ConfigError::InvalidValue {
                field: "request.headers".to_string(),
                value: header.clone(),
                reason: "Headers must have the form 'Name: value'".to_string(),
            });
        }
        if !["error", "warn", "info", "debug", "trace"].contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            });
        }
        Ok(())
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Cached Fetch Configuration
# This file was automatically generated on first run.

[client]
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = {}
request_timeout = "60s"
connect_timeout = "30s"
user_agent = "{}"

[cache]
# Cache directory (leave unset to use the system cache directory)
# cache_root = "/path/to/custom/cache"

# "file" persists entries across runs, "memory" keeps them for one process
backend = "file"

[request]
# Cache time-to-live in seconds (0 = caching disabled)
ttl_secs = 0
# Headers added to every request, e.g. ["Accept: application/json"]
headers = []

[logging]
level = "{}"  # error, warn, info, debug, trace
show_target = false
"#,
            http::POOL_MAX_PER_HOST,
            http::USER_AGENT,
            logging::DEFAULT_LEVEL,
        )
    }

    /// Runtime client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_runtime_config()
    }

    /// Runtime cache configuration, with an optional directory override
    pub fn cache_config(&self, cache_dir: Option<PathBuf>) -> CacheConfig {
        let mut config = self.cache.to_runtime_config();
        if cache_dir.is_some() {
            config.cache_root = cache_dir;
        }
        config
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive,
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            backend: self.backend,
        }
    }
}
