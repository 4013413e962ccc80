//! Per-item error taxonomy.
//!
//! Every variant here is contained in the item's `ProcessResult`; none of
//! them escape a batch run.

use thiserror::Error;

/// Transport-level failure of a single network call. Always retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connect or total request timeout elapsed.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Connection refused/reset, DNS failure, send/recv failure.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Any other transport fault.
    #[error("transport error: {0}")]
    Other(String),
}

/// Payload encode or response decode failure. Never retried: the payload
/// (or the contract with the endpoint) is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("encode payload: {0}")]
    Encode(String),
    #[error("decode response: {0}")]
    Decode(String),
}

/// Reason an item did not (or not yet) succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// HTTP 500..=504.
    #[error("server error: HTTP {status}")]
    ServerError { status: u16 },
    /// HTTP 429.
    #[error("rate limited: HTTP 429")]
    RateLimited,
    /// Any other non-2xx status (4xx, and codes outside the retryable set).
    #[error("client error: HTTP {status}")]
    ClientError { status: u16 },
    #[error(transparent)]
    Serialization(#[from] CodecError),
    /// A retryable failure with no budget left; wraps the last reason.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ItemError> },
}

impl ItemError {
    /// True for failures the retry policy may re-attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ItemError::Transport(_) | ItemError::ServerError { .. } | ItemError::RateLimited
        )
    }
}
