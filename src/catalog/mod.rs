//! Catalog
//!
//! Read-only product lookups consumed by the cart: listing, filtering by category, fetching by
//! id and free-text search.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::{Product, ProductError, ProductId};

pub mod fixtures;

pub use fixtures::FixtureCatalog;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading fixture files
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid product definition
    #[error(transparent)]
    Product(#[from] ProductError),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    /// Product refers to a category that is not defined
    #[error("Product {id} has unknown category {category:?}")]
    UnknownCategory {
        /// Product identifier
        id: ProductId,
        /// Category slug on the product
        category: String,
    },
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier
    pub id: u32,

    /// Display name
    pub name: String,

    /// Slug products refer to
    pub slug: String,
}

/// Product lookups
pub trait Catalog {
    /// All categories.
    fn categories(&self) -> &[Category];

    /// All products, or only those in `category` (by slug).
    fn products(&self, category: Option<&str>) -> Vec<&Product<'static>>;

    /// Find a product by id.
    fn product(&self, id: ProductId) -> Option<&Product<'static>>;

    /// Products whose name or description contains `query`, ignoring case.
    fn search(&self, query: &str) -> Vec<&Product<'static>>;
}

/// Case-insensitive match on a product's name or description.
pub fn matches_query(product: &Product<'_>, query: &str) -> bool {
    let query = query.to_lowercase();

    product.name.to_lowercase().contains(&query)
        || product.description.to_lowercase().contains(&query)
}
