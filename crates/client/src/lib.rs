//! Bazaar Client - Data-synchronization layer for the marketplace REST API.
//!
//! Everything a front end needs to talk to the backend lives here: the HTTP
//! adapter, the persisted session, a deduplicating query cache with
//! mutation-driven invalidation, and per-resource domain stores.
//!
//! # Example
//!
//! ```no_run
//! use bazaar_client::{Bazaar, ClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let bazaar = Bazaar::open(ClientConfig::from_env()?)?;
//! if let Some(stores) = bazaar.stores().list(None, None).await?.into_option() {
//!     for store in stores {
//!         println!("{} ({})", store.name, store.slug);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`api`] - Typed reads and mutations per resource
//! - [`query`] - Cache keys, invalidation sets and the query cache
//! - [`stores`] - Domain stores mirrored from successful reads
//! - [`session`] - Token and profile, persisted across restarts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod inquiry;
pub mod navigation;
pub mod query;
pub mod session;
pub mod state;
pub mod storage;
pub mod stores;

pub use config::{CacheConfig, ClientConfig, ConfigError, StalePolicy};
pub use error::{ApiError, Result, StorageError};
pub use inquiry::Inquiry;
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use query::{Fetched, QueryState};
pub use session::{Session, SessionStore};
pub use state::Bazaar;
pub use storage::{FileStorage, MemoryStorage, Storage};
