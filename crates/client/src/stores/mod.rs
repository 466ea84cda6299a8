//! Domain stores: last-fetched collections plus loading and error flags.
//!
//! Each store is a read-only projection for consumers. Collections are only
//! written by the resource APIs on their success paths; consumers may
//! subscribe, dismiss the error, or reset.

mod admin;
mod catalog;
mod directory;

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

pub use admin::{VendorAdmin, VendorAdminState};
pub use catalog::{ProductCatalog, ProductCatalogState};
pub use directory::{StoreDirectory, StoreDirectoryState};

/// Flags shared by every domain store state.
pub(crate) trait DomainState: Clone + Default + Send + Sync + 'static {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

/// A domain store the resource APIs can mirror loading and error flags into.
pub(crate) trait DomainStore: Clone + Send + Sync + 'static {
    type State: DomainState;

    fn cell(&self) -> &StoreCell<Self::State>;
}

/// Watch-backed state cell with a counted loading flag.
#[derive(Debug)]
pub(crate) struct StoreCell<S> {
    state: watch::Sender<S>,
    loading: AtomicUsize,
}

impl<S: DomainState> StoreCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            state: watch::Sender::new(initial),
            loading: AtomicUsize::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Apply `change` and notify subscribers once.
    pub(crate) fn update(&self, change: impl FnOnce(&mut S)) {
        self.state.send_modify(change);
    }

    /// Raise the loading flag until the guard drops. Overlapping loads keep
    /// it raised until the last one finishes.
    pub(crate) fn begin_loading(&self) -> FlagGuard<'_, S> {
        self.begin(&self.loading, S::set_loading)
    }

    /// Raise an arbitrary counted flag until the guard drops.
    pub(crate) fn begin<'a>(
        &'a self,
        counter: &'a AtomicUsize,
        set: fn(&mut S, bool),
    ) -> FlagGuard<'a, S> {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            self.update(|s| set(s, true));
        }
        FlagGuard {
            cell: self,
            counter,
            set,
        }
    }

    pub(crate) fn fail(&self, message: String) {
        self.update(|s| s.set_error(Some(message)));
    }

    pub(crate) fn clear_error(&self) {
        self.update(|s| s.set_error(None));
    }

    /// Return to the initial state, keeping the loading flag of loads still
    /// running.
    pub(crate) fn reset(&self) {
        let loading = self.loading.load(Ordering::SeqCst) > 0;
        self.state.send_modify(|s| {
            *s = S::default();
            s.set_loading(loading);
        });
    }
}

/// Lowers a counted flag on drop, including when the owning future is
/// cancelled.
pub(crate) struct FlagGuard<'a, S: DomainState> {
    cell: &'a StoreCell<S>,
    counter: &'a AtomicUsize,
    set: fn(&mut S, bool),
}

impl<S: DomainState> Drop for FlagGuard<'_, S> {
    fn drop(&mut self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let set = self.set;
            self.cell.update(|s| set(s, false));
        }
    }
}

macro_rules! domain_state {
    ($ty:ty) => {
        impl $crate::stores::DomainState for $ty {
            fn set_loading(&mut self, loading: bool) {
                self.is_loading = loading;
            }

            fn set_error(&mut self, error: Option<String>) {
                self.error = error;
            }
        }
    };
}

pub(crate) use domain_state;
