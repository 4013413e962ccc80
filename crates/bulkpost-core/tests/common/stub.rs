//! In-process transport for dispatcher tests.
//!
//! Responses come from a closure over `(item_id, attempt)`. Every call is
//! logged with its start instant, and the number of calls running at once is
//! tracked so tests can check the concurrency ceiling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bulkpost_core::retry::TransportError;
use bulkpost_core::transport::{HttpRequest, HttpResponse, RequestTemplate, Transport};

type Responder = dyn Fn(&str, u32) -> Result<HttpResponse, TransportError> + Send + Sync;

#[derive(Debug, Clone)]
pub struct Call {
    pub item_id: String,
    pub attempt: u32,
    pub at: Instant,
}

#[derive(Clone)]
pub struct StubTransport {
    responder: Arc<Responder>,
    latency: Duration,
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl StubTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, u32) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            latency: Duration::ZERO,
            current: Arc::new(AtomicUsize::new(0)),
            max_seen: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every call answers `status` with a small JSON body.
    pub fn always(status: u16) -> Self {
        Self::new(move |_, _| Ok(status_response(status)))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, item_id: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.item_id == item_id)
            .collect()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call {
            item_id: request.item_id.clone(),
            attempt: request.attempt,
            at: Instant::now(),
        });
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        self.current.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(&request.item_id, request.attempt)
    }
}

pub fn status_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        body: format!("{{\"status\":{status}}}").into_bytes(),
    }
}

pub fn template() -> RequestTemplate {
    RequestTemplate::new("http://stub.invalid/ingest")
}
