//! The signed-in user's profile.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Profile of the signed-in account, normalized from the auth responses.
///
/// The backend returns this with inconsistent field spellings; the client
/// maps every known variant into this one shape before storing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email, when the backend includes it.
    pub email: Option<String>,
    /// Account role.
    pub role: Role,
    /// Name of the vendor's store.
    pub store_name: Option<String>,
    /// Public slug of the vendor's store.
    pub store_slug: Option<String>,
    /// WhatsApp number buyers contact the vendor on.
    pub whatsapp_number: Option<String>,
    /// Short store or vendor bio.
    pub bio: Option<String>,
}

impl UserProfile {
    /// Whether this account can use the admin console.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
