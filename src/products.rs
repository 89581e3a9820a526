//! Products

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::pricing::{PricingError, format_price, parse_money};

/// Errors raised when a product record does not describe a valid product.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// A price could not be parsed.
    #[error("product {0}: {1}")]
    Price(ProductId, PricingError),

    /// Sale price is in a different currency to the list price.
    #[error("product {id}: sale price is in {sale}, list price is in {price}")]
    CurrencyMismatch {
        /// Product identifier
        id: ProductId,
        /// List price currency code
        price: &'static str,
        /// Sale price currency code
        sale: &'static str,
    },

    /// Sale price is not below the list price.
    #[error("product {0}: sale price must be lower than the list price")]
    SaleNotDiscounted(ProductId),
}

/// Product identifier, unique within a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product<'a> {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    pub description: String,

    /// Category slug
    pub category: String,

    /// List price
    pub price: Money<'a, Currency>,

    /// Sale price, always below the list price
    pub sale: Option<Money<'a, Currency>>,

    /// Units available
    pub stock: u32,

    /// Image references
    pub images: SmallVec<[String; 2]>,

    /// Average review rating
    pub rating: Decimal,

    /// Number of reviews
    pub reviews: u32,

    /// Newly listed
    pub new: bool,
}

impl<'a> Product<'a> {
    /// The price a customer pays per unit: the sale price when there is one.
    pub fn effective_price(&self) -> &Money<'a, Currency> {
        self.sale.as_ref().unwrap_or(&self.price)
    }

    /// Whether a sale price is active.
    pub fn on_sale(&self) -> bool {
        self.sale.is_some()
    }

    /// Whether any units are available.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Currency of the product's prices.
    pub fn currency(&self) -> &'a Currency {
        self.price.currency()
    }
}

/// Serialized product, shared by catalog fixtures and the persisted cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    #[serde(default)]
    pub description: String,

    /// Category slug
    #[serde(default)]
    pub category: String,

    /// List price (e.g., "59.99 USD")
    pub price: String,

    /// Sale price (e.g., "35.99 USD")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale: Option<String>,

    /// Units available
    #[serde(default)]
    pub stock: u32,

    /// Image references
    #[serde(default)]
    pub images: Vec<String>,

    /// Average review rating
    #[serde(default)]
    pub rating: Decimal,

    /// Number of reviews
    #[serde(default)]
    pub reviews: u32,

    /// Newly listed
    #[serde(default)]
    pub new: bool,
}

impl TryFrom<ProductRecord> for Product<'_> {
    type Error = ProductError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let price = parse_money(&record.price).map_err(|err| ProductError::Price(id, err))?;

        let sale = record
            .sale
            .as_deref()
            .map(parse_money)
            .transpose()
            .map_err(|err| ProductError::Price(id, err))?;

        if let Some(sale) = sale {
            if sale.currency() != price.currency() {
                return Err(ProductError::CurrencyMismatch {
                    id,
                    price: price.currency().iso_alpha_code,
                    sale: sale.currency().iso_alpha_code,
                });
            }

            if sale.to_minor_units() >= price.to_minor_units() {
                return Err(ProductError::SaleNotDiscounted(id));
            }
        }

        Ok(Product {
            id,
            name: record.name,
            description: record.description,
            category: record.category,
            price,
            sale,
            stock: record.stock,
            images: record.images.into(),
            rating: record.rating,
            reviews: record.reviews,
            new: record.new,
        })
    }
}

impl From<&Product<'_>> for ProductRecord {
    fn from(product: &Product<'_>) -> Self {
        ProductRecord {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: format_price(&product.price),
            sale: product.sale.as_ref().map(format_price),
            stock: product.stock,
            images: product.images.to_vec(),
            rating: product.rating,
            reviews: product.reviews,
            new: product.new,
        }
    }
}
