//! reqwest-backed transport
//!
//! Maps transport failures to [`FetchError::Http`], non-2xx statuses to
//! [`FetchError::Status`], and races each request against the operation's
//! cancellation token.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app::request::RequestOptions;
use crate::errors::{FetchError, FetchResult};

use super::config::ClientConfig;
use super::{RawResponse, Transport};

/// HTTP transport using a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default client configuration
    pub fn new() -> FetchResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a transport with a custom client configuration
    pub fn with_config(config: &ClientConfig) -> FetchResult<Self> {
        Ok(Self::from_client(config.build_http_client()?))
    }

    /// Wraps an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build_request(&self, url: Url, options: &RequestOptions) -> FetchResult<RequestBuilder> {
        let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::transport(format!("invalid HTTP method: {}", options.method)))?;

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    async fn execute(&self, locator: &str, options: &RequestOptions) -> FetchResult<RawResponse> {
        let url = Url::parse(locator).map_err(|e| FetchError::InvalidLocator {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

        let response = self.build_request(url, options)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Request to {} failed with HTTP {}", locator, status.as_u16());
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: locator.to_string(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), locator);
        Ok(RawResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        locator: &str,
        options: &RequestOptions,
        cancel: CancellationToken,
    ) -> FetchResult<RawResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Canceled),
            result = self.execute(locator, options) => result,
        }
    }
}
