//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (HTTP status codes,
//! transport faults, payload encode/decode failures) and exponential backoff
//! decisions so the dispatcher drives every item through the same state
//! machine:
//!
//! ```text
//! Attempting ─┬─> Success
//!             ├─> TerminalFailure
//!             ├─> Backoff ─> Attempting        (retryable, budget left)
//!             └─> Exhausted                    (retryable, budget spent)
//! ```

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_status, Outcome, StatusClass};
pub use error::{CodecError, ItemError, TransportError};
pub use policy::{next_delay, RetryDecision, RetryPolicy};
