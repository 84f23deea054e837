//! Core fetch lifecycle logic for Cached Fetch
//!
//! This module contains the fetch controller and its collaborators: the
//! observable state, request configuration, operation handles, the response
//! cache and the network transport.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cached_fetch::app::{Capabilities, FetchController, FetchRequest, HttpTransport, MemoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let capabilities = Capabilities::new(
//!     Arc::new(HttpTransport::new()?),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! let controller = FetchController::new(
//!     FetchRequest::new("https://x/data", Vec::<String>::new()).with_expiry_secs(30),
//!     capabilities,
//! );
//!
//! let mut updates = controller.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow().clone();
//!     println!("{} ({} items)", state.phase(), state.data.len());
//!     if state.is_settled() {
//!         break;
//!     }
//! }
//!
//! // Re-fetch; a fresh cache entry short-circuits the network
//! controller.start();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod controller;
pub mod handle;
pub mod request;
pub mod state;

// Re-export main public API
pub use cache::{
    CacheConfig, CacheEntry, CacheKey, CacheStore, FileStore, KeyHasher, Md5KeyHasher,
    MemoryStore, StoreBackend, StringHash,
};
pub use client::{ClientConfig, HttpTransport, RawResponse, Transport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Capabilities, FetchController};
pub use handle::{HandleSlot, OperationHandle};
pub use request::{FetchRequest, RequestOptions, ResponseTransform};
pub use state::{FetchPhase, FetchState};
