//! Transport seam: one blocking HTTP POST per call.
//!
//! The dispatcher runs `Transport::send` on the worker pool's blocking
//! threads, so implementations are free to block for the duration of the
//! call. The per-call timeout travels with the request and is enforced here,
//! not by the dispatcher.

mod libcurl;

use std::sync::Arc;
use std::time::Duration;

use crate::model::ItemId;
use crate::retry::TransportError;

pub use self::libcurl::{classify_curl_error, CurlTransport};

/// Fully built request for a single attempt.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Correlation only; not sent on the wire.
    pub item_id: ItemId,
    /// 0-based attempt number; correlation only.
    pub attempt: u32,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Arc<[u8]>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpRequest {
    pub fn method(&self) -> &'static str {
        "POST"
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one network call. Must be safe to call from many threads at once.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Per-run request shape; `build` stamps out one request per attempt.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl RequestTemplate {
    /// JSON POST to `endpoint` with 30s request and 10s connect timeouts.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Add or replace a header (case-insensitive name match).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn build(&self, item_id: &str, attempt: u32, body: Arc<[u8]>) -> HttpRequest {
        HttpRequest {
            item_id: item_id.to_string(),
            attempt,
            url: self.endpoint.clone(),
            headers: self.headers.clone(),
            body,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}
