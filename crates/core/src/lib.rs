//! Bazaar Core - Shared domain types for the marketplace client.
//!
//! This crate provides the types used across all Bazaar components:
//! - `client` - Data-synchronization layer over the marketplace REST API
//! - `cli` - Command-line front end for vendors and admins
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no caches. The backend owns every entity; these are the
//! canonical shapes the client normalizes server responses into.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles and statuses
//! - [`models`] - Client-side copies of server entities (profiles, stores, products, vendors)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
