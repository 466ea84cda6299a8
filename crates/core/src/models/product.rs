//! Products and their images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ImageId, ListingStatus, Price, ProductId, UserId};

/// An image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: ImageId,
    pub image_url: String,
    /// Display order among the product's images. Not guaranteed unique or
    /// contiguous.
    pub position: i32,
}

/// A product listed by a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub owner_user_id: UserId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub is_active: bool,
    /// Images in the order the server sent them.
    pub images: Vec<ProductImage>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Images sorted by `position`. Ties keep the server's order.
    #[must_use]
    pub fn images_in_order(&self) -> Vec<&ProductImage> {
        let mut images: Vec<&ProductImage> = self.images.iter().collect();
        images.sort_by_key(|image| image.position);
        images
    }

    /// URL of the first image in display order.
    #[must_use]
    pub fn cover_image_url(&self) -> Option<&str> {
        self.images_in_order()
            .first()
            .map(|image| image.image_url.as_str())
    }

    /// Position a newly uploaded image should take to land last.
    #[must_use]
    pub fn next_image_position(&self) -> i32 {
        self.images
            .iter()
            .map(|image| image.position + 1)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn listing_status(&self) -> ListingStatus {
        ListingStatus::from(self.is_active)
    }
}
