//! Mutations and the cache entries they make stale.
//!
//! Every mutation declares a fixed invalidation set, applied only after the
//! backend confirms success. Structural product changes (create, delete,
//! image reorder and removal) invalidate the whole product family so no
//! derived listing is missed.

use bazaar_core::{ImageId, ProductId, VendorId};

use crate::query::key::{QueryKey, ResourceFamily};

/// What to mark stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Invalidation {
    /// One exact key.
    Key(QueryKey),
    /// Every key of a family.
    Family(ResourceFamily),
}

impl Invalidation {
    /// Whether `key` falls under this invalidation.
    #[must_use]
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Family(family) => key.family() == *family,
        }
    }

    /// The family touched by this invalidation.
    #[must_use]
    pub const fn family(&self) -> ResourceFamily {
        match self {
            Self::Key(k) => k.family(),
            Self::Family(family) => *family,
        }
    }
}

/// Every write the client can send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Signup,
    Login,
    ApproveVendor(VendorId),
    CreateProduct,
    UpdateProduct(ProductId),
    SetProductStatus(ProductId),
    DeleteProduct(ProductId),
    UploadImage(ProductId),
    SetImagePosition(ImageId),
    DeleteImage(ImageId),
    UpdateStoreSettings,
}

impl Mutation {
    /// Cache entries to mark stale once this mutation succeeds.
    #[must_use]
    pub fn invalidations(&self) -> Vec<Invalidation> {
        use Invalidation::{Family, Key};

        match self {
            Self::Signup | Self::Login => Vec::new(),
            Self::ApproveVendor(_) => vec![
                Key(QueryKey::pending_vendors()),
                Key(QueryKey::approved_vendors()),
            ],
            Self::CreateProduct | Self::DeleteProduct(_) => vec![
                Family(ResourceFamily::Products),
                Key(QueryKey::my_products()),
                Key(QueryKey::active_products()),
            ],
            Self::UpdateProduct(id) | Self::SetProductStatus(id) => vec![
                Key(QueryKey::product(id)),
                Key(QueryKey::my_products()),
                Key(QueryKey::active_products()),
            ],
            Self::UploadImage(id) => vec![
                Key(QueryKey::product(id)),
                Key(QueryKey::my_products()),
            ],
            Self::SetImagePosition(_) | Self::DeleteImage(_) => vec![
                Family(ResourceFamily::Products),
                Key(QueryKey::my_products()),
            ],
            Self::UpdateStoreSettings => vec![Family(ResourceFamily::Stores)],
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
            Self::ApproveVendor(_) => "approve_vendor",
            Self::CreateProduct => "create_product",
            Self::UpdateProduct(_) => "update_product",
            Self::SetProductStatus(_) => "set_product_status",
            Self::DeleteProduct(_) => "delete_product",
            Self::UploadImage(_) => "upload_image",
            Self::SetImagePosition(_) => "set_image_position",
            Self::DeleteImage(_) => "delete_image",
            Self::UpdateStoreSettings => "update_store_settings",
        }
    }

    /// Message shown when the failure carries none of its own.
    #[must_use]
    pub const fn fallback_message(&self) -> &'static str {
        match self {
            Self::Signup => "Signup failed",
            Self::Login => "Login failed",
            Self::ApproveVendor(_) => "Failed to approve vendor",
            Self::CreateProduct => "Failed to create product",
            Self::UpdateProduct(_) => "Failed to update product",
            Self::SetProductStatus(_) => "Failed to toggle product status",
            Self::DeleteProduct(_) => "Failed to delete product",
            Self::UploadImage(_) => "Failed to upload image",
            Self::SetImagePosition(_) => "Failed to update image position",
            Self::DeleteImage(_) => "Failed to delete image",
            Self::UpdateStoreSettings => "Failed to update store settings",
        }
    }
}
