//! Resource APIs: typed reads and mutations over the backend REST surface.
//!
//! Every read goes disabled guard → query cache → HTTP adapter →
//! normalization → domain store. Every mutation invalidates its declared
//! cache entries only after the backend confirms success.

mod admin;
mod auth;
mod products;
mod stores;
pub(crate) mod wire;

use std::future::Future;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};
use crate::http::segment;
use crate::query::{
    AdminQuery, CachedValue, Fetched, Mutation, ProductQuery, QueryKey, StoreQuery,
};
use crate::state::Bazaar;
use crate::stores::DomainStore;

pub use admin::AdminApi;
pub use auth::{AuthApi, LoginRequest, SignupRequest};
pub use products::{CreateProduct, ImageUpload, ProductsApi, UpdateProduct};
pub use stores::{StoreSettingsUpdate, StoresApi};
pub use wire::ApprovalOutcome;

/// Path and query string for the request behind `key`.
fn endpoint(key: &QueryKey) -> (String, Vec<(&'static str, String)>) {
    match key {
        QueryKey::Stores(q) => match q {
            StoreQuery::List { page, page_size } => (
                "stores".into(),
                vec![("page", page.to_string()), ("page_size", page_size.to_string())],
            ),
            StoreQuery::Search(text) => ("stores/search".into(), vec![("q", text.clone())]),
            StoreQuery::ByVendor(id) => ("stores/vendor".into(), vec![("id", id.to_string())]),
            StoreQuery::BySlug(slug) => (format!("stores/{}", segment(slug)), Vec::new()),
        },
        QueryKey::Products(q) => match q {
            ProductQuery::Detail(id) => ("products".into(), vec![("id", id.to_string())]),
            ProductQuery::Active => ("products/active".into(), Vec::new()),
            ProductQuery::Mine => ("products/my".into(), Vec::new()),
            ProductQuery::Price { min, max } => {
                let mut params = Vec::new();
                if let Some(min) = min {
                    params.push(("min", min.amount().normalize().to_string()));
                }
                if let Some(max) = max {
                    params.push(("max", max.amount().normalize().to_string()));
                }
                ("products/price".into(), params)
            }
            ProductQuery::Search(text) => ("products/search".into(), vec![("q", text.clone())]),
            ProductQuery::Vendor(id) => {
                (format!("vendors/{}/products", segment(id.as_str())), Vec::new())
            }
            ProductQuery::VendorActive(id) => (
                format!("vendors/{}/products/active", segment(id.as_str())),
                Vec::new(),
            ),
        },
        QueryKey::Admin(q) => match q {
            AdminQuery::PendingVendors => ("admin/vendors/pending".into(), Vec::new()),
            AdminQuery::ApprovedVendors => ("admin/vendors/approved".into(), Vec::new()),
        },
    }
}

/// Run a cached read and mirror its outcome into `store`.
///
/// The store's loading flag covers the network call only. On success
/// `apply` writes the value into the store; on failure the store's error
/// is set to the failure's message or `fallback`. Both also run when the
/// cache refreshes the entry in the background.
async fn read<T, D, F, Fut>(
    ctx: &Bazaar,
    key: QueryKey,
    store: &D,
    fallback: &'static str,
    fetch: F,
    apply: fn(&D, &T),
) -> Result<Fetched<T>>
where
    T: CachedValue,
    D: DomainStore,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let fetch_store = store.clone();
    let fetch = move || {
        let store = fetch_store.clone();
        let request = fetch();
        async move {
            let _loading = store.cell().begin_loading();
            let result = request.await;
            match &result {
                Ok(value) => apply(&store, value),
                Err(e) => mirror_error(&store, e, fallback),
            }
            result
        }
    };

    match ctx.cache().fetch(key, fetch).await {
        Ok(Fetched::Ready(value)) => {
            apply(store, &value);
            Ok(Fetched::Ready(value))
        }
        Ok(Fetched::Disabled) => Ok(Fetched::Disabled),
        Err(e) => {
            mirror_error(store, &e, fallback);
            Err(e)
        }
    }
}

/// [`read`] for a `GET` returning one normalized value.
async fn read_one<T, D>(
    ctx: &Bazaar,
    key: QueryKey,
    store: &D,
    fallback: &'static str,
    normalize: fn(Value) -> Result<T>,
    apply: fn(&D, &T),
) -> Result<Fetched<T>>
where
    T: CachedValue,
    D: DomainStore,
{
    let http = ctx.http().clone();
    let (path, query) = endpoint(&key);
    let fetch = move || {
        let http = http.clone();
        let path = path.clone();
        let query = query.clone();
        async move { http.get(&path, &query).await.and_then(normalize) }
    };
    read(ctx, key, store, fallback, fetch, apply).await
}

/// [`read`] for a `GET` returning a list, normalized element by element.
async fn read_list<T, D>(
    ctx: &Bazaar,
    key: QueryKey,
    store: &D,
    fallback: &'static str,
    normalize: fn(Value) -> Result<T>,
    apply: fn(&D, &Vec<T>),
) -> Result<Fetched<Vec<T>>>
where
    Vec<T>: CachedValue,
    T: Send + 'static,
    D: DomainStore,
{
    let http = ctx.http().clone();
    let (path, query) = endpoint(&key);
    let what = key.operation();
    let fetch = move || {
        let http = http.clone();
        let path = path.clone();
        let query = query.clone();
        async move {
            let body = http.get(&path, &query).await?;
            Ok(wire::normalize_list(what, body, normalize))
        }
    };
    read(ctx, key, store, fallback, fetch, apply).await
}

/// Send a mutation and apply its invalidation set once it succeeds.
///
/// A failure touches no cache entry; its message is mirrored into `store`.
async fn mutate<T, D: DomainStore>(
    ctx: &Bazaar,
    store: &D,
    mutation: Mutation,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    debug!(mutation = mutation.name(), "Sending mutation");
    match request.await {
        Ok(value) => {
            for invalidation in mutation.invalidations() {
                ctx.cache().invalidate(&invalidation).await;
            }
            info!(mutation = mutation.name(), "Mutation succeeded");
            Ok(value)
        }
        Err(e) => {
            warn!(mutation = mutation.name(), error = %e, "Mutation failed");
            mirror_error(store, &e, mutation.fallback_message());
            Err(e)
        }
    }
}

/// Session rejections are handled by the HTTP adapter and not mirrored.
fn mirror_error<D: DomainStore>(store: &D, error: &ApiError, fallback: &str) {
    if !matches!(error, ApiError::SessionExpired) {
        store.cell().fail(error.user_message(fallback));
    }
}
