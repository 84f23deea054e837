//! Cached Fetch Library
//!
//! A cancellable, cache-aware fetch controller. Each controller drives one
//! remote resource through a loading/success/failure/canceled lifecycle,
//! memoizes successful responses in a pluggable store for a time-to-live,
//! and guarantees that superseded or torn-down operations never publish
//! state or write to the cache.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
