use std::sync::Arc;

use bazaar_core::Product;
use tokio::sync::watch;

use super::{DomainStore, StoreCell, domain_state};

/// Snapshot of the product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalogState {
    /// Result of the latest filtered listing (search, price range, vendor).
    pub products: Vec<Product>,
    pub active_products: Vec<Product>,
    /// The signed-in vendor's own products.
    pub my_products: Vec<Product>,
    pub is_loading: bool,
    pub error: Option<String>,
}

domain_state!(ProductCatalogState);

/// Last-fetched product collections.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    cell: Arc<StoreCell<ProductCatalogState>>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(StoreCell::new(ProductCatalogState::default())),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProductCatalogState {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProductCatalogState> {
        self.cell.subscribe()
    }

    pub fn reset(&self) {
        self.cell.reset();
    }

    pub fn clear_error(&self) {
        self.cell.clear_error();
    }

    pub(crate) fn set_products(&self, products: Vec<Product>) {
        self.cell.update(|s| {
            s.products = products;
            s.error = None;
        });
    }

    pub(crate) fn set_active_products(&self, products: Vec<Product>) {
        self.cell.update(|s| {
            s.active_products = products;
            s.error = None;
        });
    }

    pub(crate) fn set_my_products(&self, products: Vec<Product>) {
        self.cell.update(|s| {
            s.my_products = products;
            s.error = None;
        });
    }
}

impl DomainStore for ProductCatalog {
    type State = ProductCatalogState;

    fn cell(&self) -> &StoreCell<ProductCatalogState> {
        &self.cell
    }
}
