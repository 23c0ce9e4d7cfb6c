//! Registry of running simulations
//!
//! The manager hands out simulation ids, keeps the handle of every running
//! simulation, and lets callers abort one by id without holding its handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::channel::ChannelConfig;
use crate::config::SimulationSpec;
use crate::error::FloodResult;
use crate::headers::HeaderTables;
use crate::orchestrator::{
    CoordinatorBuilder, FloodHandle, SimulationEvents, SimulationId, SimulationState,
};
use crate::traits::HttpTransport;

/// Starts simulations and aborts them by id
pub struct SimulationManager {
    transport: Arc<dyn HttpTransport>,
    tables: Arc<HeaderTables>,
    channel_config: ChannelConfig,
    next_id: AtomicU64,
    simulations: Mutex<HashMap<SimulationId, FloodHandle>>,
}

impl SimulationManager {
    /// Create a manager that sends every request through `transport`
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            tables: Arc::new(HeaderTables::default()),
            channel_config: ChannelConfig::default(),
            next_id: AtomicU64::new(1),
            simulations: Mutex::new(HashMap::new()),
        }
    }

    /// Use custom User-Agent and Referer tables
    pub fn with_tables(mut self, tables: Arc<HeaderTables>) -> Self {
        self.tables = tables;
        self
    }

    /// Use a custom channel configuration
    pub fn with_channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Validate `spec` and start it on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the simulation is invalid; nothing is
    /// spawned in that case.
    pub fn run(&self, spec: SimulationSpec) -> FloodResult<(SimulationId, SimulationEvents)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let coordinator = CoordinatorBuilder::new()
            .spec(spec)
            .transport(Arc::clone(&self.transport))
            .tables(Arc::clone(&self.tables))
            .channel_config(self.channel_config.clone())
            .simulation_id(id)
            .build()?;

        let (handle, events) = coordinator.execute();

        let mut simulations = self.lock();
        simulations.retain(|_, handle| !handle.state().is_terminal());
        simulations.insert(id, handle);

        tracing::debug!(simulation_id = id, active = simulations.len(), "Simulation registered");
        Ok((id, events))
    }

    /// Abort a simulation
    ///
    /// Returns `false` for unknown ids and for simulations that already
    /// completed or were aborted.
    pub fn abort(&self, id: SimulationId) -> bool {
        let handle = self.lock().remove(&id);
        match handle {
            Some(handle) => handle.abort(),
            None => {
                tracing::debug!(simulation_id = id, "Abort requested for unknown simulation");
                false
            }
        }
    }

    /// Abort every running simulation, returns how many were aborted
    pub fn abort_all(&self) -> usize {
        let handles: Vec<FloodHandle> = self.lock().drain().map(|(_, handle)| handle).collect();
        handles.iter().filter(|handle| handle.abort()).count()
    }

    /// State of a registered simulation
    pub fn state(&self, id: SimulationId) -> Option<SimulationState> {
        self.lock().get(&id).map(FloodHandle::state)
    }

    /// Ids of simulations still running, ascending
    pub fn active(&self) -> Vec<SimulationId> {
        let mut simulations = self.lock();
        simulations.retain(|_, handle| !handle.state().is_terminal());
        let mut ids: Vec<SimulationId> = simulations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SimulationId, FloodHandle>> {
        self.simulations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SimulationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationManager")
            .field("transport", &self.transport.name())
            .field("active", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spec, MockTransport};
    use std::time::Duration;

    fn manager() -> SimulationManager {
        SimulationManager::new(Arc::new(MockTransport::status(200)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique() {
        let manager = manager();
        let (a, _ea) = manager.run(spec().with_sample(0)).unwrap();
        let (b, _eb) = manager.run(spec().with_sample(0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.active(), vec![a, b]);
        assert_eq!(manager.abort_all(), 2);
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_spec_is_rejected_without_registering() {
        let manager = manager();
        let err = manager
            .run(SimulationSpec::new("gopher://example.com", "GET"))
            .unwrap_err();
        assert!(err.is_config());
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_by_id() {
        let manager = manager();
        let (id, mut events) = manager.run(spec().with_sample(0)).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(manager.state(id), Some(SimulationState::Running));

        assert!(manager.abort(id));
        assert!(!manager.abort(id));
        assert!(events.recv().await.is_none());
        assert!(manager.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_unknown_id() {
        assert!(!manager().abort(999));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_simulations_are_pruned() {
        let manager = manager();
        let (id, events) = manager.run(spec().with_sample(2)).unwrap();

        let report = events.report().await.unwrap();
        assert_eq!(report.success_count, 2);

        assert_eq!(manager.state(id), Some(SimulationState::Completed));
        assert!(manager.active().is_empty());
        assert!(!manager.abort(id));
    }
}
