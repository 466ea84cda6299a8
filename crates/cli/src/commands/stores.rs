//! Store directory commands.

use bazaar_client::{Bazaar, Inquiry};
use bazaar_core::ProductId;

use super::{CommandError, print_line, print_products, print_stores, ready};

pub async fn list(
    bazaar: &Bazaar,
    page: Option<u32>,
    page_size: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = ready(bazaar.stores().list(page, page_size).await?, "store list")?;
    print_stores(&stores);
    Ok(())
}

pub async fn search(bazaar: &Bazaar, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stores = ready(bazaar.stores().search(query).await?, "search text")?;
    print_stores(&stores);
    Ok(())
}

pub async fn show(bazaar: &Bazaar, slug: &str) -> Result<(), Box<dyn std::error::Error>> {
    let page = ready(bazaar.stores().by_slug(slug).await?, "store slug")?;
    print_line(&format!("{} (@{})", page.store.name, page.store.username));
    if !page.store.bio.is_empty() {
        print_line(&page.store.bio);
    }
    print_line(&format!("WhatsApp: {}", page.store.whatsapp_number));
    let url = page
        .store_url
        .clone()
        .unwrap_or_else(|| bazaar.stores().public_url(&page.store.slug));
    print_line(&format!("Share: {url}"));
    print_line("");
    let products: Vec<_> = page.active_products().cloned().collect();
    print_products(&products);
    Ok(())
}

/// Select `products` on the store page and print the WhatsApp link.
pub async fn inquire(
    bazaar: &Bazaar,
    slug: &str,
    products: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let page = ready(bazaar.stores().by_slug(slug).await?, "store slug")?;
    let mut inquiry = Inquiry::new(page);
    for id in products {
        let id = ProductId::new(id.trim());
        if !inquiry.toggle(&id) {
            tracing::warn!(product_id = %id, "Product not on this store page, skipping");
        }
    }
    let Some(message) = inquiry.message() else {
        return Err(CommandError::NothingSelected.into());
    };
    let link = inquiry.whatsapp_link().ok_or(CommandError::NoWhatsappNumber)?;
    print_line(&message);
    print_line("");
    print_line(&link);
    Ok(())
}
