//! Per-request outcome types

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Code recorded for a timed out request
pub const TIMEOUT_CODE: i32 = -6;

/// What a request resolved with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutcomeCode {
    /// HTTP status code of a received response
    Status(u16),
    /// errno-style transport error code, e.g. `ECONNREFUSED`
    Transport(String),
    /// No response within the request timeout
    Timeout,
}

impl OutcomeCode {
    /// HTTP status, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            OutcomeCode::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeCode::Status(code) => write!(f, "{code}"),
            OutcomeCode::Transport(code) => write!(f, "{code}"),
            OutcomeCode::Timeout => write!(f, "{TIMEOUT_CODE}"),
        }
    }
}

// Numbers are statuses (or the timeout sentinel), strings are transport codes.
impl Serialize for OutcomeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutcomeCode::Status(code) => serializer.serialize_u16(*code),
            OutcomeCode::Transport(code) => serializer.serialize_str(code),
            OutcomeCode::Timeout => serializer.serialize_i32(TIMEOUT_CODE),
        }
    }
}

impl<'de> Deserialize<'de> for OutcomeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) if n == i64::from(TIMEOUT_CODE) => Ok(OutcomeCode::Timeout),
            Raw::Number(n) => u16::try_from(n)
                .map(OutcomeCode::Status)
                .map_err(|_| serde::de::Error::custom(format!("invalid status code {n}"))),
            Raw::Text(code) => Ok(OutcomeCode::Transport(code)),
        }
    }
}

/// Classification of one resolved request
///
/// Produced exactly once per dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    /// Status or error code
    pub code: OutcomeCode,

    /// Status >= 400, transport error or timeout
    pub is_error: bool,

    /// Transport error or timeout; implies `is_error`
    pub is_connection_failure: bool,

    /// Position of the request in its worker's dispatch sequence
    pub dispatch_index: usize,

    /// Worker that issued the request
    pub worker_index: usize,

    /// Time from dispatch to resolution
    pub latency_ms: f64,
}

impl RequestOutcome {
    /// Outcome of a received response
    pub fn response(status: u16, worker_index: usize, dispatch_index: usize) -> Self {
        Self {
            code: OutcomeCode::Status(status),
            is_error: status >= 400,
            is_connection_failure: false,
            dispatch_index,
            worker_index,
            latency_ms: 0.0,
        }
    }

    /// Outcome of a transport level failure
    pub fn transport_error(
        code: impl Into<String>,
        worker_index: usize,
        dispatch_index: usize,
    ) -> Self {
        Self {
            code: OutcomeCode::Transport(code.into()),
            is_error: true,
            is_connection_failure: true,
            dispatch_index,
            worker_index,
            latency_ms: 0.0,
        }
    }

    /// Outcome of a request that never got an answer
    pub fn timeout(worker_index: usize, dispatch_index: usize) -> Self {
        Self {
            code: OutcomeCode::Timeout,
            is_error: true,
            is_connection_failure: true,
            dispatch_index,
            worker_index,
            latency_ms: 0.0,
        }
    }

    /// Attach the measured latency
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency_ms = latency.as_secs_f64() * 1000.0;
        self
    }

    /// Neither an HTTP error nor a connection failure
    pub fn is_success(&self) -> bool {
        !self.is_error
    }
}

/// Messages a worker sends to its coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// A request resolved
    Outcome(RequestOutcome),
    /// The worker dispatched its whole quota and every request resolved
    Drained {
        /// Worker index
        worker_index: usize,
    },
    /// The worker task died without draining
    Failed {
        /// Worker index
        worker_index: usize,
        /// Panic payload or error text
        reason: String,
    },
}

impl WorkerMessage {
    /// Worker the message originates from
    pub fn worker_index(&self) -> usize {
        match self {
            WorkerMessage::Outcome(outcome) => outcome.worker_index,
            WorkerMessage::Drained { worker_index } => *worker_index,
            WorkerMessage::Failed { worker_index, .. } => *worker_index,
        }
    }
}
