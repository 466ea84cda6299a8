//! Store directory reads and store settings.

use bazaar_core::{Store, StorefrontPage, VendorId};
use serde::Serialize;
use tracing::instrument;

use super::{mutate, read_list, read_one, wire};
use crate::error::Result;
use crate::query::{Fetched, Mutation, QueryKey};
use crate::state::Bazaar;

/// Fields of the signed-in vendor's store profile to change. `None` fields
/// are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Store reads and writes.
pub struct StoresApi<'a> {
    ctx: &'a Bazaar,
}

impl<'a> StoresApi<'a> {
    pub(crate) const fn new(ctx: &'a Bazaar) -> Self {
        Self { ctx }
    }

    /// Paginated store listing. Missing or zero paging falls back to page 1
    /// of 20.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Fetched<Vec<Store>>> {
        let directory = self.ctx.store_directory();
        read_list(
            self.ctx,
            QueryKey::store_list(page, page_size),
            directory,
            "Failed to fetch stores",
            wire::normalize_store,
            |d, stores| d.set_stores(stores.clone()),
        )
        .await
    }

    /// Search stores. Disabled for blank text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, q: &str) -> Result<Fetched<Vec<Store>>> {
        read_list(
            self.ctx,
            QueryKey::store_search(q),
            self.ctx.store_directory(),
            "Failed to search stores",
            wire::normalize_store,
            |d, stores| d.set_stores(stores.clone()),
        )
        .await
    }

    /// The store owned by vendor `id`. Disabled for a blank id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn by_vendor(&self, id: &VendorId) -> Result<Fetched<Store>> {
        read_one(
            self.ctx,
            QueryKey::store_by_vendor(id),
            self.ctx.store_directory(),
            "Failed to fetch store by id",
            wire::normalize_store_body,
            |_, _| {},
        )
        .await
    }

    /// Public store page with its products. Disabled for a blank slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn by_slug(&self, slug: &str) -> Result<Fetched<StorefrontPage>> {
        read_one(
            self.ctx,
            QueryKey::store_by_slug(slug),
            self.ctx.store_directory(),
            "Failed to fetch store by slug",
            wire::normalize_storefront_page,
            |_, _| {},
        )
        .await
    }

    /// Update the signed-in vendor's store profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response holds no store.
    #[instrument(skip(self, update))]
    pub async fn update_settings(&self, update: &StoreSettingsUpdate) -> Result<Store> {
        let http = self.ctx.http();
        mutate(
            self.ctx,
            self.ctx.store_directory(),
            Mutation::UpdateStoreSettings,
            async { http.put("stores", update).await.and_then(wire::normalize_store_body) },
        )
        .await
    }

    /// Shareable public URL of the store with `slug`.
    #[must_use]
    pub fn public_url(&self, slug: &str) -> String {
        self.ctx.config().store_url(slug)
    }
}
