//! Coordinator execution logic

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelConfig;
use crate::config::SimulationSpec;
use crate::error::{FloodError, FloodResult};
use crate::outcome::WorkerMessage;
use crate::request::RequestTemplate;
use crate::traits::HttpTransport;
use crate::worker::{WorkerBuilder, WorkerStats};

use super::aggregator::ReportAggregator;
use super::handle::{
    FloodEvent, FloodHandle, SimulationEvents, SimulationId, SimulationState, StateCell,
};
use super::plan::WorkPlan;

/// FloodCoordinator runs one simulation
///
/// Responsible for spawning workers per the [`WorkPlan`], folding their
/// outcomes into a [`ReportAggregator`], forwarding events to the caller and
/// tearing everything down on completion or abort.
pub struct FloodCoordinator {
    pub(crate) simulation_id: SimulationId,
    pub(crate) spec: SimulationSpec,
    pub(crate) plan: WorkPlan,
    pub(crate) template: Arc<RequestTemplate>,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) channel_config: ChannelConfig,
}

impl FloodCoordinator {
    /// Create a new coordinator
    ///
    /// Use `CoordinatorBuilder` for validated construction.
    pub fn new(
        simulation_id: SimulationId,
        spec: SimulationSpec,
        template: Arc<RequestTemplate>,
        transport: Arc<dyn HttpTransport>,
        channel_config: ChannelConfig,
    ) -> Self {
        let plan = WorkPlan::for_spec(&spec);
        Self {
            simulation_id,
            spec,
            plan,
            template,
            transport,
            channel_config,
        }
    }

    /// Simulation id
    pub fn simulation_id(&self) -> SimulationId {
        self.simulation_id
    }

    /// Worker quotas
    pub fn plan(&self) -> &WorkPlan {
        &self.plan
    }

    /// Get the simulation spec
    pub fn spec(&self) -> &SimulationSpec {
        &self.spec
    }

    /// Start the simulation on the current tokio runtime
    ///
    /// Returns immediately. Progress and the final report arrive through the
    /// returned [`SimulationEvents`]; the [`FloodHandle`] aborts.
    pub fn execute(self) -> (FloodHandle, SimulationEvents) {
        // One slot past the configured buffer is kept for the final report
        let capacity = self.channel_config.event_buffer().max(1) + 1;
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let state = StateCell::new();
        let abort_token = CancellationToken::new();
        let simulation_id = self.simulation_id;

        let supervisor = Supervisor::new(
            simulation_id,
            self.plan.worker_count(),
            events_tx,
            state.clone(),
            abort_token.clone(),
        );
        let task = tokio::spawn(self.start_workers(supervisor));

        (
            FloodHandle::new(simulation_id, state.clone(), abort_token, task),
            SimulationEvents::new(events_rx, state),
        )
    }

    async fn start_workers(self, supervisor: Supervisor) {
        let simulation_id = self.simulation_id;
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();

        // Cancelled on completion as well as on abort
        let workers_token = supervisor.abort_token.child_token();

        tracing::info!(
            simulation_id,
            url = %self.template.url(),
            method = self.template.method(),
            workers = self.plan.worker_count(),
            sample = self.spec.sample,
            delay_ms = self.spec.dispatch_delay().as_millis() as u64,
            "Starting simulation"
        );

        let mut workers = JoinSet::new();
        for (index, quota) in self.plan.quotas().iter().enumerate() {
            let built = WorkerBuilder::new(index)
                .quota(*quota)
                .delay(self.spec.dispatch_delay())
                .template(Arc::clone(&self.template))
                .transport(Arc::clone(&self.transport))
                .messages_tx(messages_tx.clone())
                .build();

            match built {
                Ok(worker) => {
                    let token = workers_token.clone();
                    spawn_supervised(
                        &mut workers,
                        index,
                        worker.run(token.clone()),
                        messages_tx.clone(),
                        token,
                    );
                }
                Err(err) => {
                    tracing::error!(simulation_id, worker_id = index, error = %err, "Failed to build worker");
                    let _ = messages_tx.send(WorkerMessage::Failed {
                        worker_index: index,
                        reason: err.to_string(),
                    });
                }
            }
        }
        drop(messages_tx);

        supervisor.run(messages_rx, workers, workers_token).await;
    }
}

/// Folds worker messages into the report and feeds the caller's events
///
/// Never blocks on the caller: request events that do not fit the buffer are
/// dropped, and the last slot is kept for the final report.
pub(crate) struct Supervisor {
    simulation_id: SimulationId,
    worker_count: usize,
    events_tx: mpsc::Sender<FloodEvent>,
    state: StateCell,
    abort_token: CancellationToken,
}

impl Supervisor {
    pub(crate) fn new(
        simulation_id: SimulationId,
        worker_count: usize,
        events_tx: mpsc::Sender<FloodEvent>,
        state: StateCell,
        abort_token: CancellationToken,
    ) -> Self {
        Self {
            simulation_id,
            worker_count,
            events_tx,
            state,
            abort_token,
        }
    }

    /// Run until every worker finished or the simulation is aborted, then
    /// tear the workers down
    pub(crate) async fn run(
        self,
        mut messages_rx: mpsc::UnboundedReceiver<WorkerMessage>,
        mut workers: JoinSet<()>,
        workers_token: CancellationToken,
    ) {
        let simulation_id = self.simulation_id;
        let mut aggregator = ReportAggregator::new(self.worker_count);
        let mut tracker = CompletionTracker::new(self.worker_count);
        let mut events_open = true;
        let mut dropped_events = 0usize;

        let completed = loop {
            let message = tokio::select! {
                biased;
                _ = self.abort_token.cancelled() => break false,
                message = messages_rx.recv() => message,
            };

            let Some(message) = message else {
                tracing::warn!(simulation_id, "All workers exited before completion");
                break false;
            };

            // Late messages after abort are discarded
            if self.state.is_aborted() {
                break false;
            }

            match message {
                WorkerMessage::Outcome(outcome) => {
                    let worker_index = outcome.worker_index;
                    aggregator.add_outcome(outcome.clone());

                    if events_open {
                        let event = FloodEvent::RequestFinished {
                            simulation_id,
                            worker_index,
                            outcome,
                        };
                        match self.forward(event) {
                            Forwarded::Sent => {}
                            Forwarded::Dropped => {
                                if dropped_events == 0 {
                                    tracing::warn!(
                                        simulation_id,
                                        "Event buffer full, dropping request events until the caller catches up"
                                    );
                                }
                                dropped_events += 1;
                            }
                            Forwarded::Closed => {
                                tracing::debug!(simulation_id, "Event receiver dropped, continuing without events");
                                events_open = false;
                            }
                        }
                    }
                }
                WorkerMessage::Drained { worker_index } => {
                    tracing::debug!(simulation_id, worker_id = worker_index, "Worker drained");
                    tracker.mark_finished(worker_index);
                }
                WorkerMessage::Failed {
                    worker_index,
                    reason,
                } => {
                    tracing::warn!(
                        simulation_id,
                        worker_id = worker_index,
                        reason = %reason,
                        "Worker failed, counting it as finished"
                    );
                    tracker.mark_finished(worker_index);
                }
            }

            if tracker.all_finished() {
                break true;
            }
        };

        if completed && self.state.finish(SimulationState::Completed) {
            let report = aggregator.finalize();
            tracing::info!(
                simulation_id,
                success = report.success_count,
                failure = report.failure_count,
                denial = report.connection_failure_count,
                dropped_events,
                "Simulation completed"
            );
            if events_open {
                let event = FloodEvent::ExecutionFinished {
                    simulation_id,
                    report,
                };
                if self.events_tx.try_send(event).is_err() {
                    tracing::debug!(simulation_id, "Event receiver dropped before the report");
                }
            }
        }

        workers_token.cancel();
        workers.abort_all();
        while workers.join_next().await.is_some() {}

        tracing::debug!(simulation_id, state = ?self.state.load(), "Coordinator exited");
    }

    /// Queue a request event without waiting, leaving one slot free for the report
    fn forward(&self, event: FloodEvent) -> Forwarded {
        if self.events_tx.is_closed() {
            return Forwarded::Closed;
        }
        // Only this task sends, so the free capacity cannot shrink underneath
        if self.events_tx.capacity() <= 1 {
            return Forwarded::Dropped;
        }
        match self.events_tx.try_send(event) {
            Ok(()) => Forwarded::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => Forwarded::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => Forwarded::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forwarded {
    Sent,
    Dropped,
    Closed,
}

/// Run a worker future and turn a hard failure into [`WorkerMessage::Failed`]
///
/// A worker that returns an error or panics still counts as finished, so the
/// simulation can complete without it.
pub(crate) fn spawn_supervised<F>(
    workers: &mut JoinSet<()>,
    worker_index: usize,
    run: F,
    messages_tx: mpsc::UnboundedSender<WorkerMessage>,
    cancel: CancellationToken,
) where
    F: Future<Output = FloodResult<WorkerStats>> + Send + 'static,
{
    workers.spawn(async move {
        let err = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(_)) => return,
            Ok(Err(err)) => err,
            Err(panic) => FloodError::worker(panic_message(panic.as_ref())),
        };

        if cancel.is_cancelled() {
            return;
        }
        let _ = messages_tx.send(WorkerMessage::Failed {
            worker_index,
            reason: err.to_string(),
        });
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}

/// Counts each worker as finished at most once
#[derive(Debug, Clone)]
pub(crate) struct CompletionTracker {
    finished: Vec<bool>,
    count: usize,
}

impl CompletionTracker {
    pub(crate) fn new(worker_count: usize) -> Self {
        Self {
            finished: vec![false; worker_count],
            count: 0,
        }
    }

    /// Returns `true` if this is the worker's first finish
    pub(crate) fn mark_finished(&mut self, worker_index: usize) -> bool {
        match self.finished.get_mut(worker_index) {
            Some(done) if !*done => {
                *done = true;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn all_finished(&self) -> bool {
        self.count == self.finished.len()
    }
}

impl std::fmt::Debug for FloodCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloodCoordinator")
            .field("simulation_id", &self.simulation_id)
            .field("url", &self.template.url().as_str())
            .field("plan", &self.plan)
            .field("transport", &self.transport.name())
            .finish()
    }
}
