//! Time-bounded response cache
//!
//! Successful fetch results are memoized in a key-value store as two string
//! slots per entry (value and timestamp). The store itself is an injected
//! capability so tests can substitute an in-memory map.
//!
//! # Module Organization
//!
//! - [`config`] - Store selection and cache directory resolution
//! - [`store`] - [`CacheStore`] capability, [`MemoryStore`], [`FileStore`]
//! - [`key`] - [`CacheKey`] derivation and [`KeyHasher`] implementations
//! - [`entry`] - [`CacheEntry`] encoding, freshness and slot I/O
//!
//! # Examples
//!
//! ```rust
//! use cached_fetch::app::cache::{CacheEntry, CacheKey, MemoryStore, StringHash};
//! use std::time::Duration;
//!
//! let store = MemoryStore::new();
//! let key = CacheKey::from_locator("https://x/data", &StringHash);
//!
//! CacheEntry::encode(&vec![1, 2, 3], 1_000)?.save(&store, &key)?;
//!
//! let entry = CacheEntry::load(&store, &key)?.expect("both slots written");
//! assert!(entry.is_fresh(3_000, Duration::from_secs(5)));
//! assert_eq!(entry.decode::<Vec<u32>>()?, vec![1, 2, 3]);
//! # Ok::<(), cached_fetch::errors::CacheError>(())
//! ```

pub mod config;
pub mod entry;
pub mod key;
pub mod store;

// Re-export main public API
pub use config::{CacheConfig, StoreBackend};
pub use entry::CacheEntry;
pub use key::{CacheKey, KeyHasher, Md5KeyHasher, StringHash};
pub use store::{CacheStore, FileStore, MemoryStore};
