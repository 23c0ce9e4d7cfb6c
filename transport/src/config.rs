//! HTTP client configuration

use std::time::Duration;

use http_flood_core::REQUEST_TIMEOUT;

/// Configuration for the reqwest client behind [`crate::ReqwestTransport`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Deadline for a whole exchange
    pub request_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keepalive interval
    pub tcp_keepalive: Option<Duration>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 256,
            request_timeout: REQUEST_TIMEOUT,
            connect_timeout: REQUEST_TIMEOUT,
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl HttpConfig {
    /// Create config with custom request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create config with custom connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create config with custom pool size.
    pub fn with_pool_max_idle(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts_match_engine() {
        let config = HttpConfig::default();
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.connect_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_builders() {
        let config = HttpConfig::default()
            .with_request_timeout(Duration::from_millis(250))
            .with_connect_timeout(Duration::from_millis(100))
            .with_pool_max_idle(4);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(100));
        assert_eq!(config.pool_max_idle_per_host, 4);
    }
}
