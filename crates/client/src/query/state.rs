//! Values held by the query cache and the states a query can be observed in.

use bazaar_core::{Product, Store, StorefrontPage, Vendor};

use crate::error::ApiError;

/// A cached query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Stores(Vec<Store>),
    Store(Store),
    Storefront(StorefrontPage),
    Products(Vec<Product>),
    Product(Product),
    Vendors(Vec<Vendor>),
}

/// Types that can be stored in the query cache.
pub trait CachedValue: Sized + Clone + Send + Sync + 'static {
    fn into_value(self) -> QueryValue;
    fn from_value(value: QueryValue) -> Option<Self>;
}

macro_rules! cached_value {
    ($ty:ty, $variant:ident) => {
        impl CachedValue for $ty {
            fn into_value(self) -> QueryValue {
                QueryValue::$variant(self)
            }

            fn from_value(value: QueryValue) -> Option<Self> {
                match value {
                    QueryValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

cached_value!(Vec<Store>, Stores);
cached_value!(Store, Store);
cached_value!(StorefrontPage, Storefront);
cached_value!(Vec<Product>, Products);
cached_value!(Product, Product);
cached_value!(Vec<Vendor>, Vendors);

/// Outcome of an awaited read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// A required parameter was missing, so nothing was requested.
    Disabled,
    /// The query resolved.
    Ready(T),
}

impl<T> Fetched<T> {
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// The value, if the query ran.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Disabled => None,
            Self::Ready(v) => Some(v),
        }
    }

    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Disabled => None,
            Self::Ready(v) => Some(v),
        }
    }
}

/// A query as observed by a render loop.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Never requested, or evicted.
    Idle,
    /// A required parameter is missing; the query will not run.
    Disabled,
    /// A request is in flight. `placeholder` is the last settled value of
    /// the same operation, shown to avoid flicker while paging.
    Loading { placeholder: Option<T> },
    /// Cached data is available.
    Ready(T),
    /// The last attempt failed and nothing is cached.
    Failed(ApiError),
}

impl<T> QueryState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Data to render: the settled value, or the placeholder while loading.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(v)
            | Self::Loading {
                placeholder: Some(v),
            } => Some(v),
            _ => None,
        }
    }

    /// The failure to show in an error panel.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_value_variants_do_not_cross() {
        let value = Vec::<Product>::new().into_value();
        assert!(Vec::<Product>::from_value(value.clone()).is_some());
        assert!(Vec::<Store>::from_value(value).is_none());
    }

    #[test]
    fn test_query_state_data() {
        let loading: QueryState<u8> = QueryState::Loading {
            placeholder: Some(1),
        };
        assert!(loading.is_loading());
        assert_eq!(loading.data(), Some(&1));
        assert_eq!(QueryState::<u8>::Disabled.data(), None);
        assert!(QueryState::<u8>::Failed(ApiError::Decode("x".into())).error().is_some());
    }

    #[test]
    fn test_fetched() {
        assert!(Fetched::<u8>::Disabled.is_disabled());
        assert_eq!(Fetched::Ready(3).into_option(), Some(3));
    }
}
