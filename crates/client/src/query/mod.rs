//! Query cache: keys, mutation invalidation sets, and observed state.

mod cache;
mod key;
mod mutation;
mod scope;
mod state;

pub use cache::QueryCache;
pub use key::{
    AdminQuery, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, ProductQuery, QueryKey, ResourceFamily,
    StoreQuery,
};
pub use mutation::{Invalidation, Mutation};
pub use scope::ViewScope;
pub use state::{CachedValue, Fetched, QueryState, QueryValue};
