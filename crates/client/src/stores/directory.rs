use std::sync::Arc;

use bazaar_core::Store;
use tokio::sync::watch;

use super::{DomainStore, StoreCell, domain_state};

/// Snapshot of the store directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreDirectoryState {
    pub stores: Vec<Store>,
    pub is_loading: bool,
    pub error: Option<String>,
}

domain_state!(StoreDirectoryState);

/// Last-fetched store listing.
#[derive(Debug, Clone)]
pub struct StoreDirectory {
    cell: Arc<StoreCell<StoreDirectoryState>>,
}

impl Default for StoreDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(StoreCell::new(StoreDirectoryState::default())),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreDirectoryState {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreDirectoryState> {
        self.cell.subscribe()
    }

    pub fn reset(&self) {
        self.cell.reset();
    }

    pub fn clear_error(&self) {
        self.cell.clear_error();
    }

    pub(crate) fn set_stores(&self, stores: Vec<Store>) {
        self.cell.update(|s| {
            s.stores = stores;
            s.error = None;
        });
    }
}

impl DomainStore for StoreDirectory {
    type State = StoreDirectoryState;

    fn cell(&self) -> &StoreCell<StoreDirectoryState> {
        &self.cell
    }
}
