//! Fetch request configuration
//!
//! A [`FetchRequest`] is supplied by the caller and never mutated by the
//! controller. Transport options are opaque to the controller and only
//! interpreted by the [`Transport`](crate::app::client::Transport).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the raw response body is turned into the result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseTransform {
    /// Parse the body as JSON directly
    #[default]
    None,
    /// Strip a `callback(...)` wrapper before parsing as JSON
    Jsonp,
}

/// Transport options passed through verbatim with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method
    pub method: String,
    /// Request headers in the order they should be sent
    pub headers: Vec<(String, String)>,
    /// Optional request body
    pub body: Option<String>,
    /// Per-request timeout (overrides the client default)
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Set the HTTP method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Append a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Everything the controller needs to fetch one resource
#[derive(Debug, Clone)]
pub struct FetchRequest<T> {
    /// Resource address
    pub locator: String,
    /// Explicit cache key (a locator hash is used when absent)
    pub cache_key: Option<String>,
    /// Cache time-to-live; caching is enabled only when positive
    pub expiry: Option<Duration>,
    /// Body transform applied before JSON parsing
    pub transform: ResponseTransform,
    /// Transport options
    pub options: RequestOptions,
    /// Value exposed as `data` until the first successful fetch
    pub initial_data: T,
}

impl<T> FetchRequest<T> {
    /// Create a request for a locator with the given initial data
    pub fn new(locator: impl Into<String>, initial_data: T) -> Self {
        Self {
            locator: locator.into(),
            cache_key: None,
            expiry: None,
            transform: ResponseTransform::None,
            options: RequestOptions::default(),
            initial_data,
        }
    }

    /// Use an explicit cache key instead of the locator hash
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Enable caching with a time-to-live in whole seconds
    pub fn with_expiry_secs(mut self, secs: u64) -> Self {
        self.expiry = Some(Duration::from_secs(secs));
        self
    }

    /// Enable caching with an arbitrary time-to-live
    pub fn with_expiry(mut self, ttl: Duration) -> Self {
        self.expiry = Some(ttl);
        self
    }

    /// Set the response transform
    pub fn with_transform(mut self, transform: ResponseTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the transport options
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Cache time-to-live, if caching is enabled
    pub fn ttl(&self) -> Option<Duration> {
        self.expiry.filter(|ttl| !ttl.is_zero())
    }
}
