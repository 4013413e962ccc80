//! Classify attempt outcomes (HTTP status or transport error) into
//! success / retryable / terminal.

use super::error::{ItemError, TransportError};
use crate::transport::HttpResponse;

/// Classified result of one network attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<B> {
    Success(B),
    RetryableFailure(ItemError),
    TerminalFailure(ItemError),
}

impl<B> Outcome<B> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::RetryableFailure(_))
    }
}

/// Coarse class of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable,
    Terminal,
}

/// Classify an HTTP status code.
///
/// Retryable server errors are the closed range 500..=504; 505 and above are
/// terminal along with every non-429 4xx and any 1xx/3xx that reaches us.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 | 500..=504 => StatusClass::Retryable,
        _ => StatusClass::Terminal,
    }
}

/// Classify the raw result of a transport call, moving the body into a
/// `Success` outcome.
pub fn classify(raw: Result<HttpResponse, TransportError>) -> Outcome<Vec<u8>> {
    let response = match raw {
        Ok(r) => r,
        Err(e) => return Outcome::RetryableFailure(ItemError::Transport(e)),
    };
    let status = response.status;
    match classify_status(status) {
        StatusClass::Success => Outcome::Success(response.body),
        StatusClass::Retryable if status == 429 => Outcome::RetryableFailure(ItemError::RateLimited),
        StatusClass::Retryable => Outcome::RetryableFailure(ItemError::ServerError { status }),
        StatusClass::Terminal => Outcome::TerminalFailure(ItemError::ClientError { status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: b"{}".to_vec(),
        })
    }

    #[test]
    fn http_2xx_success() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify(response(201)), Outcome::Success(b"{}".to_vec()));
    }

    #[test]
    fn http_429_rate_limited() {
        assert_eq!(
            classify(response(429)),
            Outcome::RetryableFailure(ItemError::RateLimited)
        );
    }

    #[test]
    fn http_500_through_504_retryable() {
        for status in 500..=504 {
            assert_eq!(classify_status(status), StatusClass::Retryable, "{status}");
        }
        assert_eq!(
            classify(response(502)),
            Outcome::RetryableFailure(ItemError::ServerError { status: 502 })
        );
    }

    #[test]
    fn http_505_and_up_terminal() {
        assert_eq!(classify_status(505), StatusClass::Terminal);
        assert_eq!(classify_status(511), StatusClass::Terminal);
    }

    #[test]
    fn http_4xx_terminal() {
        assert_eq!(
            classify(response(404)),
            Outcome::TerminalFailure(ItemError::ClientError { status: 404 })
        );
        assert_eq!(classify_status(400), StatusClass::Terminal);
        assert_eq!(classify_status(403), StatusClass::Terminal);
    }

    #[test]
    fn redirects_terminal() {
        assert_eq!(classify_status(302), StatusClass::Terminal);
    }

    #[test]
    fn transport_errors_retryable() {
        let out = classify(Err(TransportError::Connection("refused".into())));
        assert!(out.is_retryable());
        let out = classify(Err(TransportError::Timeout("10s".into())));
        assert!(out.is_retryable());
    }
}
