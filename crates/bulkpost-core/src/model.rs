//! Work items and per-item results.

use serde::{Deserialize, Serialize};

use crate::retry::ItemError;

/// Item identifier; unique within a run.
pub type ItemId = String;

/// One immutable unit of submitted work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem<P> {
    pub id: ItemId,
    pub payload: P,
}

impl<P> WorkItem<P> {
    pub fn new(id: impl Into<ItemId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Wrap payloads as items with ids `<prefix>-0`, `<prefix>-1`, ...
    pub fn numbered<I>(prefix: &str, payloads: I) -> impl Iterator<Item = WorkItem<P>>
    where
        I: IntoIterator<Item = P>,
    {
        let prefix = prefix.to_string();
        payloads
            .into_iter()
            .enumerate()
            .map(move |(i, payload)| WorkItem::new(format!("{prefix}-{i}"), payload))
    }
}

/// Terminal state reached by an item.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<R> {
    Success(R),
    TerminalFailure(ItemError),
    /// Retryable failures until the budget ran out; holds `ItemError::RetriesExhausted`.
    Exhausted(ItemError),
}

impl<R> Resolution<R> {
    /// Stable label used in logs and the results table.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Success(_) => "success",
            Resolution::TerminalFailure(_) => "terminal",
            Resolution::Exhausted(_) => "exhausted",
        }
    }
}

/// Outcome of one work item, produced exactly once per item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult<R> {
    pub item_id: ItemId,
    /// Network attempts made (0 if the payload could not be encoded).
    pub attempts: u32,
    pub resolution: Resolution<R>,
}

impl<R> ProcessResult<R> {
    pub fn success(&self) -> bool {
        matches!(self.resolution, Resolution::Success(_))
    }

    pub fn body(&self) -> Option<&R> {
        match &self.resolution {
            Resolution::Success(body) => Some(body),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ItemError> {
        match &self.resolution {
            Resolution::Success(_) => None,
            Resolution::TerminalFailure(e) | Resolution::Exhausted(e) => Some(e),
        }
    }
}
