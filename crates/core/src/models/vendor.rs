//! Vendor accounts as seen from the admin console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Role, VendorId, VendorStatus};

/// A vendor account listed in the admin approval queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub username: String,
    pub bio: String,
    pub store_name: String,
    pub store_slug: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Vendor {
    /// Pending or approved, derived from `is_active`.
    #[must_use]
    pub const fn status(&self) -> VendorStatus {
        VendorStatus::from_active(self.is_active)
    }
}
