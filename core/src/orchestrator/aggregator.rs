//! Folding worker outcomes into one report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::RequestOutcome;

/// Final result of a simulation
///
/// `data[i]` holds worker `i`'s outcomes in the order they reached the
/// coordinator. That is completion order, not dispatch order: against a real
/// network a later request can resolve before an earlier one, so
/// `dispatch_index` is not guaranteed to increase within a worker's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// Responses below 400
    #[serde(rename = "success")]
    pub success_count: usize,

    /// Responses of 400 and above
    #[serde(rename = "failure")]
    pub failure_count: usize,

    /// Transport errors and timeouts
    #[serde(rename = "denial")]
    pub connection_failure_count: usize,

    /// Per-worker outcome logs, indexed by worker
    #[serde(rename = "data")]
    pub per_worker_outcomes: Vec<Vec<RequestOutcome>>,

    /// Number of workers spawned
    pub worker_count: usize,

    /// When aggregation started
    pub started_at: DateTime<Utc>,

    /// When the report was finalized
    pub finished_at: DateTime<Utc>,
}

impl AggregateReport {
    /// Outcomes folded into the report
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count + self.connection_failure_count
    }

    /// Share of successful requests (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        ratio(self.success_count, self.total())
    }

    /// Share of connection failures (0.0 - 1.0)
    pub fn denial_rate(&self) -> f64 {
        ratio(self.connection_failure_count, self.total())
    }

    /// Outcomes of one worker
    pub fn worker_outcomes(&self, worker_index: usize) -> &[RequestOutcome] {
        self.per_worker_outcomes
            .get(worker_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64
    } else {
        0.0
    }
}

/// Counter a folded outcome was attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    /// Counted as success
    Success,
    /// Counted as failure
    Failure,
    /// Counted as denial
    ConnectionFailure,
}

/// Accumulates outcomes until the simulation completes
///
/// Counters only grow. [`ReportAggregator::finalize`] consumes the
/// aggregator, so a report can be produced only once.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    success_count: usize,
    failure_count: usize,
    connection_failure_count: usize,
    per_worker_outcomes: Vec<Vec<RequestOutcome>>,
    worker_count: usize,
    started_at: DateTime<Utc>,
}

impl ReportAggregator {
    /// Empty aggregator for `worker_count` workers
    pub fn new(worker_count: usize) -> Self {
        Self {
            success_count: 0,
            failure_count: 0,
            connection_failure_count: 0,
            per_worker_outcomes: vec![Vec::new(); worker_count],
            worker_count,
            started_at: Utc::now(),
        }
    }

    /// Count an outcome and append it to its worker's log
    pub fn add_outcome(&mut self, outcome: RequestOutcome) -> OutcomeClass {
        let class = if outcome.is_connection_failure {
            self.connection_failure_count += 1;
            OutcomeClass::ConnectionFailure
        } else if outcome.is_error {
            self.failure_count += 1;
            OutcomeClass::Failure
        } else {
            self.success_count += 1;
            OutcomeClass::Success
        };

        let index = outcome.worker_index;
        if index >= self.per_worker_outcomes.len() {
            self.per_worker_outcomes.resize_with(index + 1, Vec::new);
        }
        self.per_worker_outcomes[index].push(outcome);

        class
    }

    /// Outcomes folded so far
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count + self.connection_failure_count
    }

    /// Successes so far
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    /// Failures so far
    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// Connection failures so far
    pub fn connection_failure_count(&self) -> usize {
        self.connection_failure_count
    }

    /// Produce the report
    pub fn finalize(self) -> AggregateReport {
        AggregateReport {
            success_count: self.success_count,
            failure_count: self.failure_count,
            connection_failure_count: self.connection_failure_count,
            per_worker_outcomes: self.per_worker_outcomes,
            worker_count: self.worker_count,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
