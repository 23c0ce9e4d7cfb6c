//! Builder pattern for FloodCoordinator construction

use std::sync::Arc;

use crate::channel::ChannelConfig;
use crate::config::SimulationSpec;
use crate::error::{FloodError, FloodResult};
use crate::headers::HeaderTables;
use crate::request::RequestTemplate;
use crate::traits::HttpTransport;

use super::executor::FloodCoordinator;
use super::handle::SimulationId;

/// Builder for creating a FloodCoordinator with proper configuration
///
/// All validation happens in [`CoordinatorBuilder::build`], so a bad spec is
/// reported before anything is spawned.
///
/// # Example
///
/// ```ignore
/// let coordinator = CoordinatorBuilder::new()
///     .spec(SimulationSpec::new("http://localhost:8080/", "GET").with_sample(100))
///     .transport(transport)
///     .build()?;
///
/// let (handle, mut events) = coordinator.execute();
/// ```
pub struct CoordinatorBuilder {
    spec: Option<SimulationSpec>,
    transport: Option<Arc<dyn HttpTransport>>,
    tables: Arc<HeaderTables>,
    channel_config: ChannelConfig,
    simulation_id: SimulationId,
}

impl CoordinatorBuilder {
    /// Create a new builder with the default header tables
    pub fn new() -> Self {
        Self {
            spec: None,
            transport: None,
            tables: Arc::new(HeaderTables::default()),
            channel_config: ChannelConfig::default(),
            simulation_id: 0,
        }
    }

    /// Set the simulation spec
    pub fn spec(mut self, spec: SimulationSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Set the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the User-Agent and Referer tables
    pub fn tables(mut self, tables: Arc<HeaderTables>) -> Self {
        self.tables = tables;
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Set the id attached to every event
    pub fn simulation_id(mut self, id: SimulationId) -> Self {
        self.simulation_id = id;
        self
    }

    /// Build the coordinator
    ///
    /// # Errors
    ///
    /// Returns an error if spec or transport are not set, or if the simulation is
    /// invalid (bad URL, scheme or method).
    pub fn build(self) -> FloodResult<FloodCoordinator> {
        let spec = self.spec.ok_or_else(|| FloodError::missing_config("spec"))?;
        let transport = self
            .transport
            .ok_or_else(|| FloodError::missing_config("transport"))?;

        spec.validate()?;
        let template = RequestTemplate::from_spec(&spec, self.tables)?;

        Ok(FloodCoordinator::new(
            self.simulation_id,
            spec,
            Arc::new(template),
            transport,
            self.channel_config,
        ))
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
