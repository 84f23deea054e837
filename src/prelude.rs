//! Prelude module for Cached Fetch
//!
//! Re-exports the items needed to drive a controller with a single
//! `use cached_fetch::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cached_fetch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = CacheConfig::default().open_store()?;
//!     let transport = Arc::new(HttpTransport::new()?);
//!
//!     let controller = FetchController::new(
//!         FetchRequest::new("https://x/data", serde_json::Value::Null).with_expiry_secs(60),
//!         Capabilities::new(transport, store),
//!     );
//!     let state = controller.settled().await;
//!     println!("{}: {}", state.phase(), state.data);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CacheError, FetchError, Result};

pub use crate::app::{
    CacheConfig, CacheStore, Capabilities, FetchController, FetchPhase, FetchRequest, FetchState,
    HttpTransport, MemoryStore, RequestOptions, ResponseTransform, Transport,
};

pub use std::sync::Arc;
