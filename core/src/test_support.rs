//! Shared test doubles

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::SimulationSpec;
use crate::headers::HeaderTables;
use crate::request::{FloodRequest, RequestTemplate};
use crate::traits::{HttpTransport, TransportError};

/// What the mock answers for one call
#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    Status(u16),
    Error(TransportError),
    Hang,
    Panic,
}

type Script = Box<dyn Fn(usize) -> (MockReply, Duration) + Send + Sync>;

/// Scripted transport: the reply and its delay depend on the call number
pub(crate) struct MockTransport {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<FloodRequest>>,
}

impl MockTransport {
    pub(crate) fn scripted(
        script: impl Fn(usize) -> (MockReply, Duration) + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `status` immediately
    pub(crate) fn status(status: u16) -> Self {
        Self::scripted(move |_| (MockReply::Status(status), Duration::ZERO))
    }

    /// Always answer with `status` after `delay`
    pub(crate) fn status_after(status: u16, delay: Duration) -> Self {
        Self::scripted(move |_| (MockReply::Status(status), delay))
    }

    /// Always fail with `ECONNREFUSED`
    pub(crate) fn refused() -> Self {
        Self::scripted(|_| {
            (
                MockReply::Error(TransportError::connection("ECONNREFUSED", "connection refused")),
                Duration::ZERO,
            )
        })
    }

    /// Never answer
    pub(crate) fn hanging() -> Self {
        Self::scripted(|_| (MockReply::Hang, Duration::ZERO))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<FloodRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: &FloodRequest) -> Result<u16, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let (reply, delay) = (self.script)(call);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Status(status) => Ok(status),
            MockReply::Error(err) => Err(err),
            MockReply::Hang => futures::future::pending().await,
            MockReply::Panic => panic!("mock transport failure"),
        }
    }
}

pub(crate) fn template_for(spec: &SimulationSpec) -> Arc<RequestTemplate> {
    Arc::new(RequestTemplate::from_spec(spec, Arc::new(HeaderTables::default())).unwrap())
}

pub(crate) fn spec() -> SimulationSpec {
    SimulationSpec::new("http://127.0.0.1:8123/success", "GET").with_delay(10)
}
