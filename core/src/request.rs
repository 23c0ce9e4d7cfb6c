//! Request types for flood operations

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{ConfigError, SimulationSpec};
use crate::headers::{HeaderComposer, HeaderSet, HeaderTables};

/// Every request gives up after this long
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// A single request, ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodRequest {
    /// Target URL
    pub url: Url,
    /// Upper-cased HTTP method
    pub method: String,
    /// Complete header set
    pub headers: HeaderSet,
    /// Body, never set for GET and HEAD
    pub body: Option<String>,
    /// Deadline for the whole exchange
    pub timeout: Duration,
}

/// Everything a worker needs to mint requests
///
/// Shared by all workers of a simulation; only the randomized headers differ
/// between two requests built from the same template.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    url: Url,
    method: String,
    body: Option<String>,
    composer: HeaderComposer,
}

impl RequestTemplate {
    /// Validate the simulation and prepare a template
    pub fn from_spec(spec: &SimulationSpec, tables: Arc<HeaderTables>) -> Result<Self, ConfigError> {
        let url = spec.target()?;
        let method = spec.http_method()?;
        let composer = HeaderComposer::from_spec(spec, tables)?;

        Ok(Self {
            url,
            method,
            body: spec.effective_payload().map(str::to_string),
            composer,
        })
    }

    /// Mint the next request
    pub fn build(&self) -> FloodRequest {
        FloodRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.composer.compose(),
            body: self.body.clone(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Body sent with every request
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Arc<HeaderTables> {
        Arc::new(HeaderTables::default())
    }

    #[test]
    fn test_get_drops_payload() {
        let spec = SimulationSpec::new("http://localhost:8123/success", "get").with_payload("test");
        let template = RequestTemplate::from_spec(&spec, tables()).unwrap();
        let request = template.build();

        assert_eq!(request.method, "GET");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_post_keeps_payload() {
        let spec =
            SimulationSpec::new("http://localhost:8123/success", "post").with_payload("test");
        let template = RequestTemplate::from_spec(&spec, tables()).unwrap();
        assert_eq!(template.build().body.as_deref(), Some("test"));
    }

    #[test]
    fn test_request_carries_fixed_timeout_and_headers() {
        let spec = SimulationSpec::new("http://localhost:8123/success", "GET");
        let template = RequestTemplate::from_spec(&spec, tables()).unwrap();
        let request = template.build();

        assert_eq!(request.timeout, Duration::from_millis(5000));
        assert_eq!(request.headers.get("host"), Some("localhost"));
        assert_eq!(request.url.path(), "/success");
    }

    #[test]
    fn test_invalid_spec_is_rejected() {
        let spec = SimulationSpec::new("", "GET");
        assert_eq!(
            RequestTemplate::from_spec(&spec, tables()).unwrap_err(),
            ConfigError::MissingUrl
        );
    }
}
