//! Canonical client-side shapes of server-owned entities.
//!
//! These are read-through copies. The backend is the only source of
//! identity and persistence; nothing here is authoritative.

pub mod product;
pub mod profile;
pub mod store;
pub mod vendor;

pub use product::{Product, ProductImage};
pub use profile::UserProfile;
pub use store::{Store, StorefrontPage};
pub use vendor::Vendor;
