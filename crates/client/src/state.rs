//! Client state shared by every consumer.

use std::sync::Arc;

use crate::api::{AdminApi, AuthApi, ProductsApi, StoresApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::navigation::{Navigator, RecordingNavigator};
use crate::query::QueryCache;
use crate::session::SessionStore;
use crate::storage::{FileStorage, Storage};
use crate::stores::{ProductCatalog, StoreDirectory, VendorAdmin};

/// Marketplace client context.
///
/// Owns the configuration, session, HTTP adapter, query cache and domain
/// stores. Cheaply cloneable via `Arc`; clones share all state, so one
/// instance is created per process and handed to every view.
#[derive(Clone)]
pub struct Bazaar {
    inner: Arc<BazaarInner>,
}

struct BazaarInner {
    config: ClientConfig,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    http: HttpClient,
    cache: QueryCache,
    directory: StoreDirectory,
    catalog: ProductCatalog,
    admin: VendorAdmin,
}

impl Bazaar {
    /// Create a client context.
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `storage` - Durable storage for the session and admin console state
    /// * `navigator` - Receives the login redirect when the session is rejected
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let session = SessionStore::open(Arc::clone(&storage));
        let http = HttpClient::new(&config, session.clone(), Arc::clone(&navigator))?;
        let cache = QueryCache::new(&config.cache);

        Ok(Self {
            inner: Arc::new(BazaarInner {
                session,
                navigator,
                http,
                cache,
                directory: StoreDirectory::new(),
                catalog: ProductCatalog::new(),
                admin: VendorAdmin::open(storage),
                config,
            }),
        })
    }

    /// Create a client context persisting to `config.state_dir`, with a
    /// [`RecordingNavigator`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.state_dir.clone()));
        Self::new(config, storage, Arc::new(RecordingNavigator::new()))
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Store listing state.
    #[must_use]
    pub fn store_directory(&self) -> &StoreDirectory {
        &self.inner.directory
    }

    /// Product collections state.
    #[must_use]
    pub fn product_catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Admin vendor queues state.
    #[must_use]
    pub fn vendor_admin(&self) -> &VendorAdmin {
        &self.inner.admin
    }

    #[must_use]
    pub const fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    #[must_use]
    pub const fn stores(&self) -> StoresApi<'_> {
        StoresApi::new(self)
    }

    #[must_use]
    pub const fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    #[must_use]
    pub const fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    /// Forget everything cached for the previous account.
    pub(crate) fn reset_account_state(&self) {
        self.inner.cache.clear();
        self.inner.directory.reset();
        self.inner.catalog.reset();
        self.inner.admin.reset();
    }
}
