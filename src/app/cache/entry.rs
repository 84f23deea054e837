//! Cache entries and their two-slot persistence

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{CacheError, CacheResult};

use super::key::CacheKey;
use super::store::CacheStore;

/// A serialized value and the time it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// JSON-serialized value
    pub value: String,
    /// Storage time in epoch milliseconds
    pub stored_at_millis: i64,
}

impl CacheEntry {
    pub fn new(value: impl Into<String>, stored_at_millis: i64) -> Self {
        Self {
            value: value.into(),
            stored_at_millis,
        }
    }

    /// Serialize `value` into an entry stamped with `now_millis`
    pub fn encode<T: Serialize>(value: &T, now_millis: i64) -> CacheResult<Self> {
        Ok(Self::new(serde_json::to_string(value)?, now_millis))
    }

    /// Deserialize the stored value
    pub fn decode<T: DeserializeOwned>(&self) -> CacheResult<T> {
        Ok(serde_json::from_str(&self.value)?)
    }

    /// Age of the entry in (fractional) seconds
    pub fn age_secs(&self, now_millis: i64) -> f64 {
        now_millis.saturating_sub(self.stored_at_millis) as f64 / 1000.0
    }

    /// Whether the entry is strictly younger than `ttl`
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        self.age_secs(now_millis) < ttl.as_secs_f64()
    }

    /// Read both slots; `None` unless both are present
    pub fn load(store: &dyn CacheStore, key: &CacheKey) -> CacheResult<Option<Self>> {
        let value = store.get(key.value_slot())?;
        let timestamp = store.get(&key.timestamp_slot())?;

        match (value, timestamp) {
            (Some(value), Some(timestamp)) => {
                // Epoch milliseconds are never negative
                let stored_at_millis = timestamp
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|millis| *millis >= 0)
                    .ok_or_else(|| CacheError::CorruptTimestamp {
                        key: key.to_string(),
                        value: timestamp.clone(),
                    })?;
                Ok(Some(Self::new(value, stored_at_millis)))
            }
            _ => Ok(None),
        }
    }

    /// Write both slots
    pub fn save(&self, store: &dyn CacheStore, key: &CacheKey) -> CacheResult<()> {
        store.set(key.value_slot(), &self.value)?;
        store.set(&key.timestamp_slot(), &self.stored_at_millis.to_string())
    }

    /// Delete both slots, attempting the second even if the first fails
    pub fn remove(store: &dyn CacheStore, key: &CacheKey) -> CacheResult<()> {
        let value = store.delete(key.value_slot());
        let timestamp = store.delete(&key.timestamp_slot());
        value.and(timestamp)
    }
}
