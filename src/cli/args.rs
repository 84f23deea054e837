//! Command-line argument parsing for Cached Fetch
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Cached Fetch - fetch JSON resources with a time-bounded local cache
#[derive(Parser, Debug)]
#[command(
    name = "cached_fetch",
    version,
    about = "Fetch JSON resources with cancellation and a time-bounded local cache",
    long_about = "Fetches a JSON (or JSONP) resource, memoizing successful responses in a local cache
for a configurable time-to-live. Press Ctrl-C to cancel an in-flight request."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource and print the decoded JSON
    Get(GetArgs),

    /// Inspect or clear cached entries
    Cache(CacheArgs),

    /// Write a default configuration file if none exists
    InitConfig,
}

/// Arguments for the get command
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Resource URL
    pub url: String,

    /// Cache time-to-live in seconds (0 disables caching)
    #[arg(short, long, value_name = "SECS")]
    pub ttl: Option<u64>,

    /// Explicit cache key instead of the URL hash
    #[arg(short = 'k', long)]
    pub cache_key: Option<String>,

    /// Strip a JSONP callback wrapper before parsing
    #[arg(long)]
    pub jsonp: bool,

    /// Request header, e.g. -H 'Accept: application/json' (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show a cached entry and its age
    Show(CacheTarget),

    /// Delete a cached entry
    Clear(CacheTarget),
}

/// Identifies one cache entry
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CacheTarget {
    /// Explicit cache key
    #[arg(short, long)]
    pub key: Option<String>,

    /// URL whose hashed key should be used
    #[arg(short, long)]
    pub url: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl GetArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if let Some(header) = self.headers.iter().find(|h| !h.contains(':')) {
            return Err(format!("Invalid header '{}': expected 'Name: value'", header));
        }
        if self.timeout == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Split a `Name: value` header into its parts
pub fn parse_header(header: &str) -> Option<(String, String)> {
    let (name, value) = header.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
