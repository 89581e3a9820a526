//! Catalog Fixtures

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    catalog::{Catalog, CatalogError, Category, matches_query},
    products::{Product, ProductId, ProductRecord},
};

/// Wrapper for a catalog in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Categories
    #[serde(default)]
    pub categories: Vec<Category>,

    /// Products in listing order
    pub products: Vec<ProductRecord>,
}

/// Catalog loaded from a YAML fixture.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    categories: Vec<Category>,
    products: Vec<Product<'static>>,
    product_index: FxHashMap<ProductId, usize>,
    currency: Option<&'static Currency>,
}

impl FixtureCatalog {
    /// Load `<base_path>/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the products are invalid.
    pub fn load(base_path: impl AsRef<Path>, name: &str) -> Result<Self, CatalogError> {
        let file_path = base_path.as_ref().join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a product is invalid, two products share an
    /// id, a product names an unknown category, or products use different currencies.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        let mut catalog = Self {
            categories: fixture.categories,
            ..Self::default()
        };

        for record in fixture.products {
            catalog.insert(Product::try_from(record)?)?;
        }

        Ok(catalog)
    }

    /// Currency shared by every product, if any are loaded.
    pub fn currency(&self) -> Option<&'static Currency> {
        self.currency
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn insert(&mut self, product: Product<'static>) -> Result<(), CatalogError> {
        let currency = product.currency();

        if let Some(existing_currency) = self.currency {
            if existing_currency != currency {
                return Err(CatalogError::CurrencyMismatch(
                    existing_currency.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
        } else {
            self.currency = Some(currency);
        }

        if self.product_index.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }

        // A blank category leaves the product uncategorised.
        if !product.category.is_empty()
            && !self
                .categories
                .iter()
                .any(|category| category.slug == product.category)
        {
            return Err(CatalogError::UnknownCategory {
                id: product.id,
                category: product.category,
            });
        }

        self.product_index.insert(product.id, self.products.len());
        self.products.push(product);

        Ok(())
    }
}

impl Catalog for FixtureCatalog {
    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn products(&self, category: Option<&str>) -> Vec<&Product<'static>> {
        self.products
            .iter()
            .filter(|product| category.is_none_or(|slug| product.category == slug))
            .collect()
    }

    fn product(&self, id: ProductId) -> Option<&Product<'static>> {
        self.product_index
            .get(&id)
            .and_then(|&index| self.products.get(index))
    }

    fn search(&self, query: &str) -> Vec<&Product<'static>> {
        self.products
            .iter()
            .filter(|product| matches_query(product, query))
            .collect()
    }
}
