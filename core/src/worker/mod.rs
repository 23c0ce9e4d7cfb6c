//! Worker module for dispatching flood requests
//!
//! A Worker owns one timer-driven dispatch loop: **tick -> dispatch -> tick**.
//! Dispatch is decoupled from completion, so the cadence controls the
//! offered load rather than the completed-request rate. Each resolved call is
//! classified into a [`RequestOutcome`](crate::outcome::RequestOutcome) and
//! sent to the coordinator.
//!
//! Lifecycle: spawned -> dispatching -> drained -> terminated, or aborted at
//! any point through the cancellation token. A worker without a quota never
//! drains on its own.
//!
//! # Example
//!
//! ```ignore
//! use http_flood_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0)
//!     .template(template)
//!     .transport(transport)
//!     .messages_tx(tx)
//!     .quota(Some(100))
//!     .build()?;
//!
//! let stats = worker.run(cancel_token).await?;
//! println!("Resolved: {}", stats.resolved);
//! ```

mod builder;
mod cadence;
mod executor;
mod stats;

pub use builder::WorkerBuilder;
pub use cadence::DispatchCadence;
pub use executor::Worker;
pub use stats::WorkerStats;
