//! Error types for http-flood-core

use thiserror::Error;

/// Broad category of an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodErrorKind {
    /// Invalid simulation configuration
    Config,
    /// A required builder field was never set
    MissingConfig,
    /// A worker could not run to completion
    Worker,
}

impl std::fmt::Display for FloodErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloodErrorKind::Config => write!(f, "configuration error"),
            FloodErrorKind::MissingConfig => write!(f, "missing configuration"),
            FloodErrorKind::Worker => write!(f, "worker error"),
        }
    }
}

/// Core error type
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct FloodError {
    /// Error category
    pub kind: FloodErrorKind,
    /// Human readable detail
    pub message: String,
}

impl FloodError {
    /// Create a new error
    pub fn new(kind: FloodErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Invalid configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(FloodErrorKind::Config, message)
    }

    /// Required builder field was not provided
    pub fn missing_config(field: &str) -> Self {
        Self::new(
            FloodErrorKind::MissingConfig,
            format!("required field `{field}` is not set"),
        )
    }

    /// Worker failure
    pub fn worker(message: impl Into<String>) -> Self {
        Self::new(FloodErrorKind::Worker, message)
    }

    /// Check if this is a configuration problem (either kind)
    pub fn is_config(&self) -> bool {
        matches!(
            self.kind,
            FloodErrorKind::Config | FloodErrorKind::MissingConfig
        )
    }
}

impl From<crate::config::ConfigError> for FloodError {
    fn from(err: crate::config::ConfigError) -> Self {
        FloodError::config(err.to_string())
    }
}

/// Result type alias
pub type FloodResult<T> = std::result::Result<T, FloodError>;
