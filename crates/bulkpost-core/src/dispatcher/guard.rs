//! RAII guard that tracks submitted-but-unresolved items.

use std::sync::Arc;

use tokio::sync::watch;

/// Increments the unresolved counter on creation, decrements on drop.
pub(super) struct UnresolvedGuard {
    counter: Arc<watch::Sender<usize>>,
}

impl UnresolvedGuard {
    pub(super) fn new(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for UnresolvedGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n = n.saturating_sub(1));
    }
}
