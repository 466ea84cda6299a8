//! Buyer inquiries sent to a store over WhatsApp.

use std::collections::HashSet;

use bazaar_core::{Price, Product, ProductId, StorefrontPage};

const GREETING: &str = "Hello! I'm interested in the following products:";
const CLOSING: &str = "Please let me know the details.";

/// A shopper's product selection on a public store page.
#[derive(Debug, Clone)]
pub struct Inquiry {
    page: StorefrontPage,
    selected: HashSet<ProductId>,
}

impl Inquiry {
    #[must_use]
    pub fn new(page: StorefrontPage) -> Self {
        Self {
            page,
            selected: HashSet::new(),
        }
    }

    /// Select `id`, or deselect it if already selected. Returns whether it
    /// is selected afterwards. Ids not on the page are ignored.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if !self.page.products.iter().any(|p| &p.id == id) {
            return false;
        }
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.selected.contains(id)
    }

    /// Selected products in page order.
    pub fn selected(&self) -> impl Iterator<Item = &Product> {
        self.page
            .products
            .iter()
            .filter(|p| self.selected.contains(&p.id))
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.selected().map(|p| p.price).sum()
    }

    /// The message text, or `None` with nothing selected.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if self.selected.is_empty() {
            return None;
        }
        let mut message = format!("{GREETING}\n\n");
        for product in self.selected() {
            message.push_str(&format!("📦 {}\n💰 {}\n", product.name, product.price.display()));
        }
        message.push_str(&format!(
            "\n💵 Total: {}\n\n{CLOSING}",
            self.total().display()
        ));
        Some(message)
    }

    /// `https://wa.me` link opening a chat with the store, prefilled with
    /// [`Inquiry::message`]. `None` with nothing selected or when the store
    /// has no usable number.
    #[must_use]
    pub fn whatsapp_link(&self) -> Option<String> {
        let digits: String = self
            .page
            .store
            .whatsapp_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        let message = self.message()?;
        Some(format!(
            "https://wa.me/{digits}?text={}",
            urlencoding::encode(&message)
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Store, StoreId, UserId};
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            owner_user_id: UserId::new("u1"),
            name: name.to_string(),
            description: String::new(),
            price: Price::new(Decimal::new(cents, 2)).unwrap(),
            is_active: true,
            images: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn page() -> StorefrontPage {
        StorefrontPage {
            store: Store {
                id: StoreId::new("s1"),
                name: "Mama Put".into(),
                slug: "mama-put".into(),
                username: "mama".into(),
                bio: String::new(),
                whatsapp_number: "+234 801 234 5678".into(),
                email: String::new(),
                updated_at: None,
            },
            products: vec![
                product("p1", "Jollof", 150_000),
                product("p2", "Suya", 123_450),
                product("p3", "Zobo", 50_000),
            ],
            store_url: None,
        }
    }

    #[test]
    fn test_empty_selection_has_no_link() {
        let inquiry = Inquiry::new(page());
        assert!(inquiry.message().is_none());
        assert!(inquiry.whatsapp_link().is_none());
    }

    #[test]
    fn test_toggle() {
        let mut inquiry = Inquiry::new(page());
        let id = ProductId::new("p1");
        assert!(inquiry.toggle(&id));
        assert!(inquiry.is_selected(&id));
        assert!(!inquiry.toggle(&id));
        assert!(!inquiry.is_selected(&id));
        assert!(!inquiry.toggle(&ProductId::new("missing")));
    }

    #[test]
    fn test_message_lists_selection_in_page_order_with_total() {
        let mut inquiry = Inquiry::new(page());
        inquiry.toggle(&ProductId::new("p2"));
        inquiry.toggle(&ProductId::new("p1"));

        let message = inquiry.message().unwrap();
        assert!(message.starts_with(GREETING));
        let jollof = message.find("Jollof").unwrap();
        let suya = message.find("Suya").unwrap();
        assert!(jollof < suya);
        assert!(message.contains("💰 ₦1,234.50"));
        assert!(message.contains("💵 Total: ₦2,734.50"));
        assert!(message.ends_with(CLOSING));
        assert!(!message.contains("Zobo"));
    }

    #[test]
    fn test_link_uses_digits_and_encodes_text() {
        let mut inquiry = Inquiry::new(page());
        inquiry.toggle(&ProductId::new("p3"));
        let link = inquiry.whatsapp_link().unwrap();
        assert!(link.starts_with("https://wa.me/2348012345678?text=Hello%21%20I"));
        assert!(!link.contains(' '));
    }
}
