use thiserror::Error;

/// Errors that escape the per-item containment boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `submit` called after `shutdown`/`abort`.
    #[error("dispatcher is shutting down; submission rejected")]
    ShuttingDown,
    /// The worker pool or token pool became unusable.
    #[error("worker infrastructure failure: {0}")]
    FatalInfrastructure(String),
}
