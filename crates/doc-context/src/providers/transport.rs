//! HTTP transport for streamed generation responses

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{Error, Result};

/// Response body delivered as chunks in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Trait for POSTing JSON and receiving a chunked response body
///
/// Implementations:
/// - `HttpTransport`: reqwest client with an optional API key header
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Send `body` to `url` and return the response body stream.
    ///
    /// Connection errors and non-success statuses fail before any chunk is
    /// yielded; errors while reading a chunk are yielded as stream items.
    async fn post_stream(&self, url: &str, body: &serde_json::Value) -> Result<ByteStream>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Create a transport with a request timeout and optional `x-goog-api-key`
    pub fn new(timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn post_stream(&self, url: &str, body: &serde_json::Value) -> Result<ByteStream> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-goog-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!("HTTP {} - {}", status, body)));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::transport(format!("Stream error: {}", e))));

        Ok(Box::pin(stream))
    }
}
