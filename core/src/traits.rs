//! Core traits for HTTP transports
//!
//! The trait is defined in core so the engine never depends on a concrete
//! HTTP client. Implementations live in their own crate (`transport/`).

use crate::outcome::{OutcomeCode, RequestOutcome};
use crate::request::FloodRequest;
use async_trait::async_trait;
use std::time::Duration;

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends one request and reports the status code of the response
///
/// Implementations must not retry. The response body may be discarded.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Transport identifier used in logs
    fn name(&self) -> &str;

    /// Send the request and return the response status
    async fn send(&self, request: &FloodRequest) -> Result<u16, TransportError>;
}

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established or broke mid-exchange
    #[error("connection failed ({code}): {message}")]
    Connection {
        /// errno-style code, e.g. `ECONNREFUSED`
        code: String,
        /// Underlying error text
        message: String,
    },

    /// No response before the deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built by the transport
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Shorthand for a connection failure
    pub fn connection(code: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Connection {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Code recorded in the request outcome
    pub fn to_outcome_code(&self) -> OutcomeCode {
        match self {
            TransportError::Connection { code, .. } => OutcomeCode::Transport(code.clone()),
            TransportError::Timeout(_) => OutcomeCode::Timeout,
            TransportError::InvalidRequest(_) => OutcomeCode::Transport("EREQUEST".to_string()),
        }
    }

    /// Classify as a connection failure outcome
    pub fn into_outcome(self, worker_index: usize, dispatch_index: usize) -> RequestOutcome {
        match self.to_outcome_code() {
            OutcomeCode::Timeout => RequestOutcome::timeout(worker_index, dispatch_index),
            code => RequestOutcome::transport_error(code.to_string(), worker_index, dispatch_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_to_outcome_code() {
        assert_eq!(
            TransportError::connection("ECONNREFUSED", "refused").to_outcome_code(),
            OutcomeCode::Transport("ECONNREFUSED".into())
        );
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(5)).to_outcome_code(),
            OutcomeCode::Timeout
        );
        assert_eq!(
            TransportError::InvalidRequest("bad".into()).to_outcome_code(),
            OutcomeCode::Transport("EREQUEST".into())
        );
    }

    #[test]
    fn test_into_outcome_is_connection_failure() {
        let outcome = TransportError::connection("ECONNRESET", "reset").into_outcome(1, 7);
        assert!(outcome.is_connection_failure);
        assert!(outcome.is_error);
        assert_eq!(outcome.worker_index, 1);
        assert_eq!(outcome.dispatch_index, 7);

        let timeout = TransportError::Timeout(Duration::from_secs(5)).into_outcome(0, 0);
        assert_eq!(timeout.code, OutcomeCode::Timeout);
    }
}
