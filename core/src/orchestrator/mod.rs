//! Coordinator for simulation lifecycle management
//!
//! The FloodCoordinator runs one simulation end to end:
//! - Partitioning the sample across workers ([`WorkPlan`])
//! - Spawning workers and supervising hard failures
//! - Folding outcomes into an [`AggregateReport`]
//! - Aborting on request, after which nothing more is emitted
//!
//! # Example
//!
//! ```ignore
//! use http_flood_core::{CoordinatorBuilder, FloodEvent, SimulationSpec};
//!
//! let coordinator = CoordinatorBuilder::new()
//!     .spec(SimulationSpec::new("http://localhost:8080/", "GET").with_sample(100))
//!     .transport(transport)
//!     .build()?;
//!
//! let (handle, mut events) = coordinator.execute();
//! while let Some(event) = events.recv().await {
//!     if let FloodEvent::ExecutionFinished { report, .. } = event {
//!         println!("{} ok / {} failed", report.success_count, report.failure_count);
//!     }
//! }
//! ```

mod aggregator;
mod builder;
mod executor;
mod handle;
mod plan;

pub use aggregator::{AggregateReport, OutcomeClass, ReportAggregator};
pub use builder::CoordinatorBuilder;
pub use executor::FloodCoordinator;
pub use handle::{FloodEvent, FloodHandle, SimulationEvents, SimulationId, SimulationState};
pub use plan::WorkPlan;
