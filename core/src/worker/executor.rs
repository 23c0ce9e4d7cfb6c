//! Worker dispatch loop

use crate::error::FloodResult;
use crate::outcome::{RequestOutcome, WorkerMessage};
use crate::request::{FloodRequest, RequestTemplate};
use crate::traits::HttpTransport;

use super::cadence::DispatchCadence;
use super::stats::WorkerStats;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Worker fires requests on a fixed cadence: tick -> dispatch -> repeat
///
/// Dispatch never waits for earlier requests, so several calls can be in
/// flight at once. Every call is a task in the worker's `JoinSet`; resolved
/// calls are classified and reported to the coordinator from the worker loop
/// itself, which keeps all counters single-owner.
pub struct Worker {
    /// Worker index within the simulation
    index: usize,

    /// Requests to dispatch before draining, `None` runs until cancelled
    quota: Option<usize>,

    /// Delay between two dispatches
    delay: Duration,

    /// Request factory (shared across workers via Arc)
    template: Arc<RequestTemplate>,

    /// HTTP transport (shared across workers via Arc)
    transport: Arc<dyn HttpTransport>,

    /// Channel to the coordinator, unbounded so reporting never stalls dispatch
    messages_tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        index: usize,
        quota: Option<usize>,
        delay: Duration,
        template: Arc<RequestTemplate>,
        transport: Arc<dyn HttpTransport>,
        messages_tx: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Self {
        Self {
            index,
            quota,
            delay,
            template,
            transport,
            messages_tx,
        }
    }

    /// Run the dispatch loop
    ///
    /// Returns when the quota is drained, when `cancel` fires, or when the
    /// coordinator hung up. On cancellation every in-flight call is aborted
    /// and nothing more is reported.
    pub async fn run(self, cancel: CancellationToken) -> FloodResult<WorkerStats> {
        let mut stats = WorkerStats::new();
        stats.start();

        let mut cadence = DispatchCadence::new(self.delay);
        let mut in_flight: JoinSet<RequestOutcome> = JoinSet::new();

        tracing::debug!(
            worker_id = self.index,
            quota = ?self.quota,
            delay_ms = self.delay.as_millis() as u64,
            "Worker started"
        );

        if self.is_drained(&stats) {
            self.emit(WorkerMessage::Drained { worker_index: self.index }, &cancel);
            stats.stop();
            return Ok(stats);
        }

        loop {
            let can_dispatch = self.can_dispatch(&stats);

            tokio::select! {
                biased;

                // Abort wins over everything that is ready at the same time
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        worker_id = self.index,
                        in_flight = in_flight.len(),
                        "Worker aborted"
                    );
                    in_flight.abort_all();
                    break;
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let outcome = match joined {
                        Ok(outcome) => outcome,
                        // Only cancellation lands here, execute_one contains panics
                        Err(_) => continue,
                    };

                    stats.record_outcome(&outcome);
                    if !self.emit(WorkerMessage::Outcome(outcome), &cancel) {
                        break;
                    }

                    if self.is_drained(&stats) {
                        tracing::debug!(
                            worker_id = self.index,
                            resolved = stats.resolved,
                            "Worker drained"
                        );
                        self.emit(WorkerMessage::Drained { worker_index: self.index }, &cancel);
                        break;
                    }
                }

                _ = cadence.tick(), if can_dispatch => {
                    let dispatch_index = stats.record_dispatch();
                    let request = self.template.build();
                    tracing::trace!(worker_id = self.index, dispatch_index, "Dispatching request");
                    in_flight.spawn(execute_one(
                        Arc::clone(&self.transport),
                        request,
                        self.index,
                        dispatch_index,
                    ));
                }
            }
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.index,
            dispatched = stats.dispatched,
            resolved = stats.resolved,
            successes = stats.successes,
            failures = stats.failures,
            connection_failures = stats.connection_failures,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        Ok(stats)
    }

    /// Send a message unless the worker was cancelled first.
    /// Returns `false` when nothing more should be sent.
    fn emit(&self, message: WorkerMessage, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.messages_tx.send(message).is_err() {
            tracing::debug!(worker_id = self.index, "Coordinator channel closed, worker stopping");
            return false;
        }
        true
    }

    /// Quota not yet exhausted (always true when unbounded)
    fn can_dispatch(&self, stats: &WorkerStats) -> bool {
        match self.quota {
            Some(quota) => stats.dispatched < quota,
            None => true,
        }
    }

    /// Whole quota dispatched and resolved
    fn is_drained(&self, stats: &WorkerStats) -> bool {
        match self.quota {
            Some(quota) => stats.dispatched == quota && stats.resolved == stats.dispatched,
            None => false,
        }
    }

    /// Get the worker index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the worker quota
    pub fn quota(&self) -> Option<usize> {
        self.quota
    }
}

/// Issue one call and classify how it resolved
///
/// Exactly one of response, transport error, timeout or a contained panic
/// decides the outcome.
async fn execute_one(
    transport: Arc<dyn HttpTransport>,
    request: FloodRequest,
    worker_index: usize,
    dispatch_index: usize,
) -> RequestOutcome {
    let start = Instant::now();
    let call = AssertUnwindSafe(transport.send(&request)).catch_unwind();

    let outcome = match tokio::time::timeout(request.timeout, call).await {
        Ok(Ok(Ok(status))) => RequestOutcome::response(status, worker_index, dispatch_index),
        Ok(Ok(Err(err))) => {
            tracing::trace!(worker_id = worker_index, dispatch_index, error = %err, "Request failed");
            err.into_outcome(worker_index, dispatch_index)
        }
        Ok(Err(_)) => {
            tracing::warn!(
                worker_id = worker_index,
                dispatch_index,
                transport = transport.name(),
                "Transport panicked while sending request"
            );
            RequestOutcome::transport_error("EPANIC", worker_index, dispatch_index)
        }
        Err(_) => RequestOutcome::timeout(worker_index, dispatch_index),
    };

    outcome.with_latency(start.elapsed())
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("index", &self.index)
            .field("quota", &self.quota)
            .field("delay", &self.delay)
            .field("transport", &self.transport.name())
            .field("url", &self.template.url().as_str())
            .finish()
    }
}
