//! Simulation handle, lifecycle state and event stream

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::outcome::RequestOutcome;

use super::aggregator::AggregateReport;

/// Identifier of a simulation
pub type SimulationId = u64;

/// Lifecycle of a simulation
///
/// `Running` moves to exactly one of `Completed` or `Aborted`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Workers are dispatching or draining
    Running,
    /// Every worker finished and the report was produced
    Completed,
    /// Stopped by the caller before completion
    Aborted,
}

impl SimulationState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SimulationState::Completed,
            2 => SimulationState::Aborted,
            _ => SimulationState::Running,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SimulationState::Running => 0,
            SimulationState::Completed => 1,
            SimulationState::Aborted => 2,
        }
    }

    /// Completed or aborted
    pub fn is_terminal(self) -> bool {
        self != SimulationState::Running
    }
}

/// Shared state cell, first transition out of `Running` wins
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SimulationState::Running.as_u8())))
    }

    pub(crate) fn load(&self) -> SimulationState {
        SimulationState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `Running` to `to`; false if another transition won
    pub(crate) fn finish(&self, to: SimulationState) -> bool {
        self.0
            .compare_exchange(
                SimulationState::Running.as_u8(),
                to.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.load() == SimulationState::Aborted
    }
}

/// Notification emitted while a simulation runs
#[derive(Debug, Clone, PartialEq)]
pub enum FloodEvent {
    /// One request resolved
    RequestFinished {
        /// Simulation the outcome belongs to
        simulation_id: SimulationId,
        /// Worker that issued the request
        worker_index: usize,
        /// How the request resolved
        outcome: RequestOutcome,
    },

    /// Every worker finished; emitted at most once, and never after abort
    ExecutionFinished {
        /// Simulation that completed
        simulation_id: SimulationId,
        /// Final report
        report: AggregateReport,
    },
}

impl FloodEvent {
    /// Simulation the event belongs to
    pub fn simulation_id(&self) -> SimulationId {
        match self {
            FloodEvent::RequestFinished { simulation_id, .. }
            | FloodEvent::ExecutionFinished { simulation_id, .. } => *simulation_id,
        }
    }
}

/// Receiving side of a simulation's events
///
/// Once the simulation is aborted nothing more is delivered, even events that
/// were already buffered.
#[derive(Debug)]
pub struct SimulationEvents {
    rx: mpsc::Receiver<FloodEvent>,
    state: StateCell,
}

impl SimulationEvents {
    pub(crate) fn new(rx: mpsc::Receiver<FloodEvent>, state: StateCell) -> Self {
        Self { rx, state }
    }

    /// Next event, `None` when the simulation ended or was aborted
    pub async fn recv(&mut self) -> Option<FloodEvent> {
        if self.state.is_aborted() {
            return None;
        }
        let event = self.rx.recv().await?;
        if self.state.is_aborted() {
            return None;
        }
        Some(event)
    }

    /// Wait for the final report, skipping per-request events
    ///
    /// Returns `None` if the simulation was aborted.
    pub async fn report(mut self) -> Option<AggregateReport> {
        while let Some(event) = self.recv().await {
            if let FloodEvent::ExecutionFinished { report, .. } = event {
                return Some(report);
            }
        }
        None
    }
}

/// Caller's handle on a running simulation
pub struct FloodHandle {
    id: SimulationId,
    state: StateCell,
    abort_token: CancellationToken,
    task: JoinHandle<()>,
}

impl FloodHandle {
    pub(crate) fn new(
        id: SimulationId,
        state: StateCell,
        abort_token: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            state,
            abort_token,
            task,
        }
    }

    /// Simulation id
    pub fn id(&self) -> SimulationId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SimulationState {
        self.state.load()
    }

    /// Stop the simulation
    ///
    /// Cancels every worker and every in-flight request. Returns `true` only
    /// for the call that actually aborted; repeated calls, and calls after
    /// completion, do nothing.
    pub fn abort(&self) -> bool {
        if !self.state.finish(SimulationState::Aborted) {
            return false;
        }
        tracing::info!(simulation_id = self.id, "Simulation aborted");
        self.abort_token.cancel();
        true
    }

    /// Coordinator task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the coordinator task to exit and return the final state
    pub async fn wait(self) -> SimulationState {
        if let Err(err) = self.task.await {
            tracing::error!(simulation_id = self.id, error = %err, "Coordinator task failed");
        }
        self.state.load()
    }
}

impl std::fmt::Debug for FloodHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloodHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
