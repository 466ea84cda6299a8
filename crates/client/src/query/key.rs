//! Structured query cache keys.
//!
//! A key is a resource family plus a typed operation carrying normalized
//! parameters. Constructors normalize inputs (trimmed search text, default
//! pagination, absent price bounds) so equivalent calls land on the same
//! entry.

use std::fmt;

use bazaar_core::{Price, ProductId, VendorId};

/// Default page number for store listings.
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size for store listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Top-level resource families. Broad invalidations target a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Stores,
    Products,
    Admin,
}

impl ResourceFamily {
    /// All families, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Stores, Self::Products, Self::Admin];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stores => "stores",
            Self::Products => "products",
            Self::Admin => "admin",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Stores => 0,
            Self::Products => 1,
            Self::Admin => 2,
        }
    }
}

/// Store queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreQuery {
    List { page: u32, page_size: u32 },
    Search(String),
    ByVendor(VendorId),
    BySlug(String),
}

/// Product queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductQuery {
    Detail(ProductId),
    Active,
    Mine,
    Price {
        min: Option<Price>,
        max: Option<Price>,
    },
    Search(String),
    Vendor(VendorId),
    VendorActive(VendorId),
}

/// Admin console queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminQuery {
    PendingVendors,
    ApprovedVendors,
}

/// Key of one query cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Stores(StoreQuery),
    Products(ProductQuery),
    Admin(AdminQuery),
}

impl QueryKey {
    /// Paginated store listing. `None` or zero fall back to the defaults.
    #[must_use]
    pub fn store_list(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        Self::Stores(StoreQuery::List { page, page_size })
    }

    #[must_use]
    pub fn store_search(q: &str) -> Self {
        Self::Stores(StoreQuery::Search(q.trim().to_string()))
    }

    #[must_use]
    pub fn store_by_vendor(id: &VendorId) -> Self {
        Self::Stores(StoreQuery::ByVendor(VendorId::new(id.as_str().trim())))
    }

    #[must_use]
    pub fn store_by_slug(slug: &str) -> Self {
        Self::Stores(StoreQuery::BySlug(slug.trim().to_string()))
    }

    #[must_use]
    pub fn product(id: &ProductId) -> Self {
        Self::Products(ProductQuery::Detail(ProductId::new(id.as_str().trim())))
    }

    #[must_use]
    pub const fn active_products() -> Self {
        Self::Products(ProductQuery::Active)
    }

    #[must_use]
    pub const fn my_products() -> Self {
        Self::Products(ProductQuery::Mine)
    }

    #[must_use]
    pub const fn products_by_price(min: Option<Price>, max: Option<Price>) -> Self {
        Self::Products(ProductQuery::Price { min, max })
    }

    #[must_use]
    pub fn product_search(q: &str) -> Self {
        Self::Products(ProductQuery::Search(q.trim().to_string()))
    }

    #[must_use]
    pub fn vendor_products(id: &VendorId) -> Self {
        Self::Products(ProductQuery::Vendor(VendorId::new(id.as_str().trim())))
    }

    #[must_use]
    pub fn vendor_active_products(id: &VendorId) -> Self {
        Self::Products(ProductQuery::VendorActive(VendorId::new(
            id.as_str().trim(),
        )))
    }

    #[must_use]
    pub const fn pending_vendors() -> Self {
        Self::Admin(AdminQuery::PendingVendors)
    }

    #[must_use]
    pub const fn approved_vendors() -> Self {
        Self::Admin(AdminQuery::ApprovedVendors)
    }

    /// The family this key belongs to.
    #[must_use]
    pub const fn family(&self) -> ResourceFamily {
        match self {
            Self::Stores(_) => ResourceFamily::Stores,
            Self::Products(_) => ResourceFamily::Products,
            Self::Admin(_) => ResourceFamily::Admin,
        }
    }

    /// Operation name without parameters.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Stores(q) => match q {
                StoreQuery::List { .. } => "stores.list",
                StoreQuery::Search(_) => "stores.search",
                StoreQuery::ByVendor(_) => "stores.vendor",
                StoreQuery::BySlug(_) => "stores.slug",
            },
            Self::Products(q) => match q {
                ProductQuery::Detail(_) => "products.detail",
                ProductQuery::Active => "products.active",
                ProductQuery::Mine => "products.my",
                ProductQuery::Price { .. } => "products.price",
                ProductQuery::Search(_) => "products.search",
                ProductQuery::Vendor(_) => "products.vendor",
                ProductQuery::VendorActive(_) => "products.vendor-active",
            },
            Self::Admin(q) => match q {
                AdminQuery::PendingVendors => "admin.pending-vendors",
                AdminQuery::ApprovedVendors => "admin.approved-vendors",
            },
        }
    }

    /// Whether a loading read may show the previous result of the same
    /// operation. Only the paginated store listing does, so a page change
    /// keeps the old page on screen; detail reads never borrow another
    /// resource's data.
    #[must_use]
    pub const fn keeps_previous_data(&self) -> bool {
        matches!(self, Self::Stores(StoreQuery::List { .. }))
    }

    /// Whether the query has the parameters it needs to run. Disabled
    /// queries never reach the network.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Stores(q) => match q {
                StoreQuery::List { .. } => true,
                StoreQuery::Search(s) | StoreQuery::BySlug(s) => !s.is_empty(),
                StoreQuery::ByVendor(id) => !id.is_blank(),
            },
            Self::Products(q) => match q {
                ProductQuery::Active | ProductQuery::Mine => true,
                ProductQuery::Detail(id) => !id.is_blank(),
                ProductQuery::Price { min, max } => min.is_some() || max.is_some(),
                ProductQuery::Search(s) => !s.is_empty(),
                ProductQuery::Vendor(id) | ProductQuery::VendorActive(id) => !id.is_blank(),
            },
            Self::Admin(_) => true,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())?;
        match self {
            Self::Stores(StoreQuery::List { page, page_size }) => {
                write!(f, "[{page},{page_size}]")
            }
            Self::Stores(StoreQuery::Search(s) | StoreQuery::BySlug(s))
            | Self::Products(ProductQuery::Search(s)) => write!(f, "[{s}]"),
            Self::Stores(StoreQuery::ByVendor(id))
            | Self::Products(ProductQuery::Vendor(id) | ProductQuery::VendorActive(id)) => {
                write!(f, "[{id}]")
            }
            Self::Products(ProductQuery::Detail(id)) => write!(f, "[{id}]"),
            Self::Products(ProductQuery::Price { min, max }) => {
                let bound = |p: &Option<Price>| p.map(|p| p.amount().to_string()).unwrap_or_default();
                write!(f, "[{},{}]", bound(min), bound(max))
            }
            _ => Ok(()),
        }
    }
}
