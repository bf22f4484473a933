//! Cache types for backend responses.

use crate::backend::types::{ProductPage, ProductQuery};

/// Cache key for slow-changing listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    BlogCategories,
    PublicProducts(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    BlogCategories(Vec<String>),
    Products(ProductPage),
}
