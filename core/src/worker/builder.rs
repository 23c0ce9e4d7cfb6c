//! Builder pattern for Worker construction

use crate::config::DEFAULT_DELAY_MS;
use crate::error::{FloodError, FloodResult};
use crate::outcome::WorkerMessage;
use crate::request::RequestTemplate;
use crate::traits::HttpTransport;

use super::executor::Worker;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Builder for creating Worker instances
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .template(template)
///     .transport(transport)
///     .messages_tx(tx)
///     .quota(Some(100))
///     .delay(Duration::from_millis(10))
///     .build()?;
/// ```
pub struct WorkerBuilder {
    index: usize,
    quota: Option<usize>,
    delay: Duration,
    template: Option<Arc<RequestTemplate>>,
    transport: Option<Arc<dyn HttpTransport>>,
    messages_tx: Option<mpsc::UnboundedSender<WorkerMessage>>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker index
    pub fn new(index: usize) -> Self {
        Self {
            index,
            quota: None,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            template: None,
            transport: None,
            messages_tx: None,
        }
    }

    /// Set the request quota, `None` for unbounded
    pub fn quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Set the dispatch delay
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the request template
    pub fn template(mut self, template: Arc<RequestTemplate>) -> Self {
        self.template = Some(template);
        self
    }

    /// Set the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the coordinator channel sender
    pub fn messages_tx(mut self, tx: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        self.messages_tx = Some(tx);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> FloodResult<Worker> {
        let template = self
            .template
            .ok_or_else(|| FloodError::missing_config("template"))?;
        let transport = self
            .transport
            .ok_or_else(|| FloodError::missing_config("transport"))?;
        let messages_tx = self
            .messages_tx
            .ok_or_else(|| FloodError::missing_config("messages_tx"))?;

        Ok(Worker::new(
            self.index,
            self.quota,
            self.delay,
            template,
            transport,
            messages_tx,
        ))
    }
}
