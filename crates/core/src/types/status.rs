//! Role and status enums for marketplace accounts and listings.

use serde::{Deserialize, Serialize};

/// Account role as reported by the backend.
///
/// Anything other than `admin` is treated as a vendor account, which is
/// what the backend creates on signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Marketplace operator who approves vendors.
    Admin,
    /// Seller managing a single store.
    #[default]
    Vendor,
}

impl Role {
    /// Parse the backend's free-form role string.
    #[must_use]
    pub fn from_wire(role: Option<&str>) -> Self {
        match role.map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Vendor,
        }
    }

    /// The role as the backend spells it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
        }
    }
}

/// Approval state of a vendor account.
///
/// The backend has no dedicated field; a vendor is approved exactly when
/// its account is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    /// Waiting for an admin to approve the account.
    Pending,
    /// Approved and able to sell.
    Approved,
}

impl VendorStatus {
    /// Derive the status from the account's active flag.
    #[must_use]
    pub const fn from_active(is_active: bool) -> Self {
        if is_active {
            Self::Approved
        } else {
            Self::Pending
        }
    }
}

/// Whether a product is shown on the public storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Visible to shoppers.
    Active,
    /// Hidden from the storefront but still owned by the vendor.
    Inactive,
}

impl From<bool> for ListingStatus {
    fn from(is_active: bool) -> Self {
        if is_active { Self::Active } else { Self::Inactive }
    }
}
