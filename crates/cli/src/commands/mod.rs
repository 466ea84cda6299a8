//! Subcommand implementations.
//!
//! Results go to stdout; diagnostics go through `tracing` to stderr.

pub mod admin;
pub mod auth;
pub mod products;
pub mod stores;

use bazaar_client::Fetched;
use bazaar_core::{Product, Store, Vendor};
use thiserror::Error;

/// Errors raised by the CLI itself rather than the client.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not signed in. Run `bazaar login` first")]
    NotSignedIn,

    #[error("Nothing to look up: {0}")]
    EmptyInput(&'static str),

    #[error("None of the given products are on this store page")]
    NothingSelected,

    #[error("Store has no usable WhatsApp number")]
    NoWhatsappNumber,

    #[error("No password given. Set BAZAAR_PASSWORD or pass --password-stdin")]
    MissingPassword,

    #[error("Could not read the password from stdin: {0}")]
    ReadPassword(#[source] std::io::Error),

    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
}

/// The fetched value, or an error naming what was missing.
pub(crate) fn ready<T>(fetched: Fetched<T>, what: &'static str) -> Result<T, CommandError> {
    fetched.into_option().ok_or(CommandError::EmptyInput(what))
}

#[allow(clippy::print_stdout)]
pub(crate) fn print_line(line: &str) {
    println!("{line}");
}

pub(crate) fn print_stores(stores: &[Store]) {
    if stores.is_empty() {
        print_line("No stores found.");
    }
    for store in stores {
        print_line(&format!("{:<24} {:<32} @{}", store.slug, store.name, store.username));
    }
}

pub(crate) fn print_products(products: &[Product]) {
    if products.is_empty() {
        print_line("No products found.");
    }
    for product in products {
        let status = if product.is_active { "" } else { " (hidden)" };
        print_line(&format!(
            "{:<12} {:<32} {:>14}{status}",
            product.id,
            product.name,
            product.price.display()
        ));
    }
}

pub(crate) fn print_vendors(vendors: &[Vendor]) {
    if vendors.is_empty() {
        print_line("No vendors.");
    }
    for vendor in vendors {
        print_line(&format!(
            "{:<12} {:<24} {:<28} {}",
            vendor.id, vendor.name, vendor.email, vendor.store_name
        ));
    }
}
