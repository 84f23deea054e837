//! Error types for Cached Fetch
//!
//! This module defines the error types for all components of the crate.
//! Fetch errors are never returned across the controller's public boundary;
//! they are surfaced through [`crate::app::FetchState::error`]. The remaining
//! types cover the cache capability, configuration and the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while performing a single fetch operation
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error: HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Transport-defined failure from a non-HTTP transport
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Response body could not be decoded into the result type
    #[error("Failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    /// Locator could not be parsed
    #[error("Invalid locator: {locator} - {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The operation's own cancellation token fired
    #[error("Fetch operation was canceled")]
    Canceled,
}

impl FetchError {
    /// Create a transport error with a message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Check whether this error is the cancellation signal
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::Canceled)
    }
}

/// Response body decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Body was not valid UTF-8 text
    #[error("Response body is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Body (or unwrapped payload) was not valid JSON for the result type
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Body did not match the expected `callback(...)` framing
    #[error("Malformed JSONP wrapper: {reason}")]
    JsonpWrapper { reason: String },
}

/// Cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error in a persistent store
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized for storage
    #[error("Failed to serialize cached value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Timestamp slot holds something other than epoch milliseconds
    #[error("Corrupt cache timestamp for {key}: {value}")]
    CorruptTimestamp { key: String, value: String },

    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// In-memory store lock was poisoned by a panicking writer
    #[error("Cache store lock poisoned")]
    Poisoned,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration directory could not be determined
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(FetchError::Decode(_)) => "decode",
            AppError::Fetch(FetchError::Canceled) => "canceled",
            AppError::Fetch(_) => "network",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Decode result type alias
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
