//! http-flood-core: Engine for HTTP flood traffic simulations
//!
//! This crate provides everything between a simulation description and its
//! final report, independent of any concrete HTTP client:
//!
//! - Simulation configuration ([`SimulationSpec`])
//! - Per-request header randomization ([`HeaderComposer`])
//! - The worker dispatch loop ([`Worker`])
//! - Fan-out, abort and aggregation ([`FloodCoordinator`], [`AggregateReport`])
//! - A registry of running simulations ([`SimulationManager`])
//! - The transport seam ([`HttpTransport`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod headers;
pub mod manager;
pub mod orchestrator;
pub mod outcome;
pub mod request;
pub mod traits;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use channel::ChannelConfig;
pub use config::*;
pub use error::*;
pub use headers::*;
pub use manager::SimulationManager;
pub use orchestrator::{
    AggregateReport, CoordinatorBuilder, FloodCoordinator, FloodEvent, FloodHandle, OutcomeClass,
    ReportAggregator, SimulationEvents, SimulationId, SimulationState, WorkPlan,
};
pub use outcome::*;
pub use request::*;
pub use traits::*;
pub use worker::{DispatchCadence, Worker, WorkerBuilder, WorkerStats};
