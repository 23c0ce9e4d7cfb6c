//! reqwest implementation of [`HttpTransport`]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client, Method};

use http_flood_core::{FloodRequest, HttpTransport, TransportError};

use crate::config::HttpConfig;
use crate::errors::classify;

/// HTTP transport backed by a pooled reqwest client
///
/// Redirects are not followed and bodies are never decompressed; only the
/// status code of the first response matters.
///
/// # Example
///
/// ```rust,ignore
/// let transport = Arc::new(ReqwestTransport::new()?);
/// let manager = SimulationManager::new(transport);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// The underlying reqwest client
    client: Client,

    /// Configuration used to create the client
    config: HttpConfig,
}

impl ReqwestTransport {
    /// Create a transport with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a transport with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_config(config: HttpConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none());

        if let Some(keepalive) = config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Get the configuration for this transport.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn header_map(request: &FloodRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in request.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, request: &FloodRequest) -> Result<u16, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let headers = Self::header_map(request)?;

        let mut builder = self
            .client
            .request(method, request.url.clone())
            .headers(headers)
            .timeout(request.timeout.min(self.config.request_timeout));
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&e, request.timeout.min(self.config.request_timeout)))?;

        let status = response.status().as_u16();
        tracing::trace!(url = %request.url, status, "Response received");
        Ok(status)
    }
}
