use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use bazaar_core::{Vendor, VendorId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use super::{DomainStore, FlagGuard, StoreCell, domain_state};
use crate::storage::{ADMIN_NAMESPACE, Storage};

/// Snapshot of the admin vendor console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorAdminState {
    pub pending_vendors: Vec<Vendor>,
    pub approved_vendors: Vec<Vendor>,
    /// Vendor highlighted in the console.
    pub selected_vendor: Option<Vendor>,
    pub is_loading: bool,
    /// An approval is being sent.
    pub is_fetching: bool,
    pub error: Option<String>,
}

domain_state!(VendorAdminState);

/// Persisted subset of [`VendorAdminState`].
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedAdmin {
    #[serde(default)]
    pending_vendors: Vec<Vendor>,
    #[serde(default)]
    approved_vendors: Vec<Vendor>,
    #[serde(default)]
    selected_vendor: Option<Vendor>,
}

/// Pending and approved vendor queues for the admin console.
///
/// Collections and the selection survive restarts under the `admin-store`
/// namespace. Flags do not.
#[derive(Clone)]
pub struct VendorAdmin {
    inner: Arc<VendorAdminInner>,
}

struct VendorAdminInner {
    cell: StoreCell<VendorAdminState>,
    approving: AtomicUsize,
    storage: Arc<dyn Storage>,
}

impl VendorAdmin {
    /// Open the console state, restoring persisted queues.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let restored = restore(storage.as_ref());
        Self {
            inner: Arc::new(VendorAdminInner {
                cell: StoreCell::new(VendorAdminState {
                    pending_vendors: restored.pending_vendors,
                    approved_vendors: restored.approved_vendors,
                    selected_vendor: restored.selected_vendor,
                    ..VendorAdminState::default()
                }),
                approving: AtomicUsize::new(0),
                storage,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> VendorAdminState {
        self.inner.cell.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VendorAdminState> {
        self.inner.cell.subscribe()
    }

    /// Highlight a vendor, or clear the highlight.
    pub fn select_vendor(&self, vendor: Option<Vendor>) {
        self.inner.cell.update(|s| s.selected_vendor = vendor);
        self.persist();
    }

    pub fn reset(&self) {
        self.inner.cell.reset();
        if let Err(e) = self.inner.storage.remove(ADMIN_NAMESPACE) {
            warn!(error = %e, "Failed to remove persisted admin state");
        }
    }

    pub fn clear_error(&self) {
        self.inner.cell.clear_error();
    }

    pub(crate) fn begin_approving(&self) -> FlagGuard<'_, VendorAdminState> {
        self.inner
            .cell
            .begin(&self.inner.approving, |s, on| s.is_fetching = on)
    }

    pub(crate) fn set_pending_vendors(&self, vendors: Vec<Vendor>) {
        self.inner.cell.update(|s| {
            s.pending_vendors = vendors;
            s.error = None;
        });
        self.persist();
    }

    pub(crate) fn set_approved_vendors(&self, vendors: Vec<Vendor>) {
        self.inner.cell.update(|s| {
            s.approved_vendors = vendors;
            s.error = None;
        });
        self.persist();
    }

    /// Drop `id` from the pending queue, and from the selection if it is
    /// the selected vendor.
    pub(crate) fn remove_from_pending(&self, id: &VendorId) {
        self.inner.cell.update(|s| {
            s.pending_vendors.retain(|v| &v.id != id);
            if s.selected_vendor.as_ref().is_some_and(|v| &v.id == id) {
                s.selected_vendor = None;
            }
        });
        self.persist();
    }

    /// Put `vendor` at the head of the approved queue unless already there.
    pub(crate) fn add_to_approved(&self, vendor: Vendor) {
        self.inner.cell.update(|s| {
            if !s.approved_vendors.iter().any(|v| v.id == vendor.id) {
                s.approved_vendors.insert(0, vendor);
            }
        });
        self.persist();
    }

    fn persist(&self) {
        let state = self.inner.cell.snapshot();
        let persisted = PersistedAdmin {
            pending_vendors: state.pending_vendors,
            approved_vendors: state.approved_vendors,
            selected_vendor: state.selected_vendor,
        };
        let result = serde_json::to_string(&persisted)
            .map_err(crate::error::StorageError::from)
            .and_then(|json| self.inner.storage.save(ADMIN_NAMESPACE, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist admin state");
        }
    }
}

impl DomainStore for VendorAdmin {
    type State = VendorAdminState;

    fn cell(&self) -> &StoreCell<VendorAdminState> {
        &self.inner.cell
    }
}

fn restore(storage: &dyn Storage) -> PersistedAdmin {
    match storage.load(ADMIN_NAMESPACE) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable admin state");
            PersistedAdmin::default()
        }),
        Ok(None) => PersistedAdmin::default(),
        Err(e) => {
            warn!(error = %e, "Failed to load admin state");
            PersistedAdmin::default()
        }
    }
}
