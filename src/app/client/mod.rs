//! Network transport capability
//!
//! The controller talks to the network only through [`Transport`]. A
//! transport receives the locator, the caller's opaque [`RequestOptions`]
//! and the operation's cancellation token, and returns the fully read
//! response body.
//!
//! The module is organized into specialized components:
//! - `config`: reqwest client configuration and building
//! - `http`: [`HttpTransport`], the reqwest-backed transport
//! - `decode`: body decoding including the JSONP unwrap

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::app::request::{RequestOptions, ResponseTransform};
use crate::errors::{DecodeResult, FetchResult};

pub mod config;
pub mod decode;
pub mod http;

pub use config::ClientConfig;
pub use decode::{decode_body, strip_jsonp};
pub use http::HttpTransport;

/// Response with its body already read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code reported by the transport
    pub status: u16,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Successful response with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8 text
    pub fn text(&self) -> DecodeResult<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    /// Body parsed as JSON into `T`
    pub fn json<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        decode_body(&self.body, ResponseTransform::None)
    }

    /// Body decoded into `T` with the given transform
    pub fn decode<T: DeserializeOwned>(&self, transform: ResponseTransform) -> DecodeResult<T> {
        decode_body(&self.body, transform)
    }
}

/// Asynchronous network capability
///
/// Implementations should stop work and return [`FetchError::Canceled`]
/// when `cancel` fires; the controller also races every call against the
/// token, so a transport that ignores it is still canceled promptly.
///
/// [`FetchError::Canceled`]: crate::errors::FetchError::Canceled
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn fetch(
        &self,
        locator: &str,
        options: &RequestOptions,
        cancel: CancellationToken,
    ) -> FetchResult<RawResponse>;
}
