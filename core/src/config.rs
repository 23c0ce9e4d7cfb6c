//! Simulation configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Dispatch delay used when none (or zero) is configured
pub const DEFAULT_DELAY_MS: u64 = 1;

/// Worker count used when none (or zero) is configured, and for unbounded runs
pub const DEFAULT_THREADS: usize = 2;

/// Description of one flood simulation
///
/// Built by the caller and never mutated by the engine. `sample == 0` means
/// the run is unbounded and only stops when aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSpec {
    /// Target URL (http or https)
    #[serde(default)]
    pub url: String,

    /// HTTP method, case-insensitive
    #[serde(default)]
    pub method: String,

    /// Request body; ignored for GET and HEAD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// User supplied headers, these always win over computed ones
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Total number of requests, 0 for no limit
    #[serde(default)]
    pub sample: usize,

    /// Milliseconds between two dispatches of the same worker
    #[serde(default = "default_delay")]
    pub delay: u64,

    /// Requested number of workers
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Add a randomized `Referer`
    #[serde(default = "default_true")]
    pub auto_referer: bool,

    /// Add a randomized `User-Agent`
    #[serde(default = "default_true")]
    pub auto_user_agent: bool,

    /// Add a randomized `Keep-Alive`
    #[serde(default = "default_true")]
    pub auto_keep_alive: bool,
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_true() -> bool {
    true
}

impl SimulationSpec {
    /// Create a spec with defaults for everything but the target
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            payload: None,
            headers: BTreeMap::new(),
            sample: 0,
            delay: DEFAULT_DELAY_MS,
            threads: DEFAULT_THREADS,
            auto_referer: true,
            auto_user_agent: true,
            auto_keep_alive: true,
        }
    }

    /// Parse a spec from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Set the request body
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Add a user header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the total number of requests (0 = unbounded)
    pub fn with_sample(mut self, sample: usize) -> Self {
        self.sample = sample;
        self
    }

    /// Set the dispatch delay in milliseconds
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = delay_ms;
        self
    }

    /// Set the requested worker count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Toggle the randomized `Referer` header
    pub fn with_auto_referer(mut self, enabled: bool) -> Self {
        self.auto_referer = enabled;
        self
    }

    /// Toggle the randomized `User-Agent` header
    pub fn with_auto_user_agent(mut self, enabled: bool) -> Self {
        self.auto_user_agent = enabled;
        self
    }

    /// Toggle the randomized `Keep-Alive` header
    pub fn with_auto_keep_alive(mut self, enabled: bool) -> Self {
        self.auto_keep_alive = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target()?;
        self.http_method()?;
        Ok(())
    }

    /// Parsed target URL
    pub fn target(&self) -> Result<Url, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        let url =
            Url::parse(self.url.trim()).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!("{} has no host", self.url)));
        }
        Ok(url)
    }

    /// Upper-cased HTTP method
    pub fn http_method(&self) -> Result<String, ConfigError> {
        let method = self.method.trim();
        if method.is_empty() {
            return Err(ConfigError::MissingMethod);
        }
        if !method.bytes().all(is_token_char) {
            return Err(ConfigError::InvalidMethod(method.to_string()));
        }
        Ok(method.to_ascii_uppercase())
    }

    /// GET and HEAD never carry a body
    pub fn drops_payload(&self) -> bool {
        let method = self.method.trim();
        method.eq_ignore_ascii_case("get") || method.eq_ignore_ascii_case("head")
    }

    /// The body that will actually be sent
    pub fn effective_payload(&self) -> Option<&str> {
        if self.drops_payload() {
            None
        } else {
            self.payload.as_deref().filter(|p| !p.is_empty())
        }
    }

    /// Delay between dispatches, a zero delay falls back to the default
    pub fn dispatch_delay(&self) -> Duration {
        let ms = if self.delay == 0 {
            DEFAULT_DELAY_MS
        } else {
            self.delay
        };
        Duration::from_millis(ms)
    }

    /// Requested worker count, zero falls back to the default
    pub fn requested_threads(&self) -> usize {
        if self.threads == 0 {
            DEFAULT_THREADS
        } else {
            self.threads
        }
    }

    /// Whether the run stops on its own
    pub fn is_bounded(&self) -> bool {
        self.sample > 0
    }
}

/// RFC 7230 `tchar`
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No target URL
    #[error("the \"url\" option is not configured")]
    MissingUrl,

    /// The URL does not parse
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Only http and https are supported
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// No HTTP method
    #[error("the \"method\" option is not configured")]
    MissingMethod,

    /// Method is not a valid HTTP token
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// Malformed serialized spec
    #[error("could not parse simulation spec: {0}")]
    Parse(String),
}
