//! Cache configuration types and defaults

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

use super::store::{CacheStore, FileStore, MemoryStore};

/// Which store implementation backs the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map, lost on exit
    Memory,
    /// One file per slot under the cache directory
    #[default]
    File,
}

/// Configuration for the cache store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for file storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Store implementation
    pub backend: StoreBackend,
}

impl CacheConfig {
    /// Create a file-backed configuration with a custom root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Set the store backend
    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Resolve the directory used by the file store
    pub fn resolve_root(&self) -> CacheResult<PathBuf> {
        if let Some(root) = &self.cache_root {
            return Ok(root.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(cache::DIR_NAME))
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from(cache::DIR_NAME),
            })
    }

    /// Open the configured store
    pub fn open_store(&self) -> CacheResult<Arc<dyn CacheStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::File => Ok(Arc::new(FileStore::new(self.resolve_root()?)?)),
        }
    }
}
