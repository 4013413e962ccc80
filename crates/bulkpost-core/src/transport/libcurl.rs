//! libcurl-backed transport (one easy handle per call).

use curl::easy::{Easy, List};

use super::{HttpRequest, HttpResponse, Transport};
use crate::retry::TransportError;

/// Blocking JSON POST over libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    follow_redirects: bool,
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow 3xx responses instead of returning them (they classify as terminal).
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// Map a curl error to a transport error kind.
pub fn classify_curl_error(e: &curl::Error) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::Timeout(e.to_string());
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return TransportError::Connection(e.to_string());
    }
    TransportError::Other(e.to_string())
}

fn map_err(e: curl::Error) -> TransportError {
    classify_curl_error(&e)
}

impl Transport for CurlTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut easy = Easy::new();
        easy.url(&request.url).map_err(map_err)?;
        easy.post(true).map_err(map_err)?;
        easy.post_fields_copy(&request.body).map_err(map_err)?;
        easy.follow_location(self.follow_redirects).map_err(map_err)?;
        easy.connect_timeout(request.connect_timeout).map_err(map_err)?;
        easy.timeout(request.timeout).map_err(map_err)?;

        let mut list = List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(map_err)?;
        }
        // Suppress "Expect: 100-continue" round trip on larger bodies.
        list.append("Expect:").map_err(map_err)?;
        easy.http_headers(list).map_err(map_err)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(map_err)?;
            transfer.perform().map_err(map_err)?;
        }

        let status = easy.response_code().map_err(map_err)?;
        Ok(HttpResponse {
            status: status as u16,
            body,
        })
    }
}
