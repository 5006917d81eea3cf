//! Transport capability consumed by the interceptor and the orchestrator.
//!
//! A transport is a one-shot asynchronous `fetch(url) -> bytes | failure`.
//! The production implementation wraps the HTTP fetch pipeline; tests
//! substitute scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use offpage_core::Error;

use crate::fetch::{FetchClient, FetchConfig};

/// One-shot asynchronous byte fetch for a logical URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, Error>;
}

/// Transport backed by the reqwest fetch pipeline.
pub struct HttpTransport {
    client: FetchClient,
}

impl HttpTransport {
    /// Create a transport with the given fetch configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Ok(Self { client: FetchClient::new(config)? })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        Ok(self.client.fetch(url).await?.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_transport_new() {
        let transport = HttpTransport::new(FetchConfig::default());
        assert!(transport.is_ok());
    }
}
