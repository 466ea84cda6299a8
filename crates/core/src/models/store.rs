//! Vendor storefronts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Product;
use crate::types::StoreId;

/// A vendor's public store.
///
/// `slug` is the stable public lookup key used in store URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    pub username: String,
    pub bio: String,
    pub whatsapp_number: String,
    pub email: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A store together with its listed products, as served by the public
/// store page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontPage {
    pub store: Store,
    pub products: Vec<Product>,
    /// Shareable URL reported by the backend, if any.
    pub store_url: Option<String>,
}

impl StorefrontPage {
    /// Products that shoppers should see.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_active)
    }
}
