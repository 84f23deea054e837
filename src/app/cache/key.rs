//! Cache key derivation
//!
//! An entry lives in two slots: `<base>` for the serialized value and
//! `<base>:ts` for the storage timestamp. The base is the caller's explicit
//! cache key or `useFetch:<hash(locator)>`.

use std::fmt;

use crate::app::request::FetchRequest;
use crate::constants::cache::{KEY_PREFIX, TIMESTAMP_SUFFIX};

/// Deterministic string to fixed-width identifier function
pub trait KeyHasher: Send + Sync + fmt::Debug {
    fn hash(&self, input: &str) -> String;
}

/// 32-bit djb2 hash (xor variant) rendered as a decimal number
///
/// Iterates UTF-16 code units from the end of the string, so keys match
/// those produced by the equivalent browser-side helper.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringHash;

impl StringHash {
    pub fn hash_u32(input: &str) -> u32 {
        let units: Vec<u16> = input.encode_utf16().collect();
        units
            .iter()
            .rev()
            .fold(5381u32, |hash, &unit| hash.wrapping_mul(33) ^ u32::from(unit))
    }
}

impl KeyHasher for StringHash {
    fn hash(&self, input: &str) -> String {
        Self::hash_u32(input).to_string()
    }
}

/// MD5 digest rendered as 32 lowercase hex characters
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5KeyHasher;

impl KeyHasher for Md5KeyHasher {
    fn hash(&self, input: &str) -> String {
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}

/// Base key of a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Use an explicit key verbatim
    pub fn explicit(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive the key from a locator hash
    pub fn from_locator(locator: &str, hasher: &dyn KeyHasher) -> Self {
        Self(format!("{}{}", KEY_PREFIX, hasher.hash(locator)))
    }

    /// Key for a request: its explicit key, else the locator hash
    pub fn for_request<T>(request: &FetchRequest<T>, hasher: &dyn KeyHasher) -> Self {
        match &request.cache_key {
            Some(key) => Self::explicit(key.clone()),
            None => Self::from_locator(&request.locator, hasher),
        }
    }

    /// Slot holding the serialized value
    pub fn value_slot(&self) -> &str {
        &self.0
    }

    /// Slot holding the storage timestamp
    pub fn timestamp_slot(&self) -> String {
        format!("{}{}", self.0, TIMESTAMP_SUFFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
