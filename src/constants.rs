//! Application constants for Cached Fetch
//!
//! This module centralizes the constants used throughout the crate,
//! organized by functional domain.

use std::time::Duration;

/// Cache key layout
pub mod cache {
    /// Prefix for keys derived from a locator hash
    pub const KEY_PREFIX: &str = "useFetch:";

    /// Suffix of the slot holding the storage timestamp
    pub const TIMESTAMP_SUFFIX: &str = ":ts";

    /// Directory name used under the OS cache directory
    pub const DIR_NAME: &str = "cached-fetch";

    /// Extension of value files written by the file store
    pub const FILE_EXTENSION: &str = "entry";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("cached-fetch/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE: &str = "cached-fetch.toml";

    /// Directory name under the user config directory
    pub const DIR_NAME: &str = "cached-fetch";

    /// Configuration file name inside the config directory
    pub const FILE_NAME: &str = "config.toml";

    /// Environment variable overriding the configuration file path
    pub const ENV_CONFIG_PATH: &str = "CACHED_FETCH_CONFIG";
}

/// Logging defaults
pub mod logging {
    /// Tracing target used by the crate
    pub const TARGET: &str = "cached_fetch";

    /// Default log level
    pub const DEFAULT_LEVEL: &str = "warn";
}

// Commonly used constants re-exported at module level
pub use cache::{KEY_PREFIX, TIMESTAMP_SUFFIX};
pub use http::USER_AGENT;
