//! Lifetime of a consuming view.
//!
//! Dropping a read future abandons its result. [`ViewScope`] makes that
//! explicit for views that spawn reads: once the view is torn down, pending
//! reads resolve to `None` and never write into state the view owns.

use std::future::Future;

use tokio::sync::watch;

/// Teardown signal shared by the reads of one view.
#[derive(Debug, Clone)]
pub struct ViewScope {
    closed: watch::Sender<bool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            closed: watch::Sender::new(false),
        }
    }

    /// Mark the view as gone. Pending and future [`ViewScope::run`] calls
    /// return `None`.
    pub fn teardown(&self) {
        self.closed.send_replace(true);
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        *self.closed.borrow()
    }

    /// Drive `fut` unless the view is torn down first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }
        tokio::select! {
            biased;
            _ = closed.wait_for(|torn_down| *torn_down) => None,
            output = fut => Some(output),
        }
    }
}
