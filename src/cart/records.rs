//! Cart Records
//!
//! The serialized form of a cart, as written to [`crate::storage::CartStorage`].

use std::num::NonZeroU32;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, LineItem},
    pricing::{PricingError, currency_from_code},
    products::{Product, ProductError, ProductId, ProductRecord},
};

/// Errors raised when a serialized cart cannot be read back.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Payload is not valid JSON for a cart record.
    #[error("Failed to parse cart: {0}")]
    Json(#[from] serde_json::Error),

    /// Cart currency is not supported.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A product snapshot is invalid.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// A product snapshot is priced in a different currency to the cart.
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// The same product appears on more than one line.
    #[error("Duplicate line for product {0}")]
    DuplicateProduct(ProductId),

    /// A line has a quantity of zero.
    #[error("Line for product {0} has no quantity")]
    ZeroQuantity(ProductId),
}

/// Serialized cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    /// Cart currency code (e.g., "USD")
    pub currency: String,

    /// Lines in insertion order
    pub items: Vec<LineItemRecord>,
}

/// Serialized line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    /// Product snapshot
    pub product: ProductRecord,

    /// Line quantity
    pub quantity: u32,
}

impl From<&Cart<'_>> for CartRecord {
    fn from(cart: &Cart<'_>) -> Self {
        CartRecord {
            currency: cart.currency().iso_alpha_code.to_string(),
            items: cart
                .items()
                .iter()
                .map(|item| LineItemRecord {
                    product: ProductRecord::from(item.product()),
                    quantity: item.quantity(),
                })
                .collect(),
        }
    }
}

impl TryFrom<CartRecord> for Cart<'_> {
    type Error = RecordError;

    fn try_from(record: CartRecord) -> Result<Self, Self::Error> {
        let currency = currency_from_code(&record.currency)?;
        let mut seen = FxHashSet::default();
        let mut cart = Cart::new(currency);

        for line in record.items {
            let product = Product::try_from(line.product)?;

            if product.currency() != currency {
                return Err(RecordError::CurrencyMismatch(
                    currency.iso_alpha_code.to_string(),
                    product.currency().iso_alpha_code.to_string(),
                ));
            }

            if !seen.insert(product.id) {
                return Err(RecordError::DuplicateProduct(product.id));
            }

            let quantity =
                NonZeroU32::new(line.quantity).ok_or(RecordError::ZeroQuantity(product.id))?;

            cart.items.push(LineItem::new(product, quantity));
        }

        Ok(cart)
    }
}

/// Serialize a cart to its JSON payload.
///
/// # Errors
///
/// Returns [`RecordError::Json`] if serialization fails.
pub fn encode(cart: &Cart<'_>) -> Result<String, RecordError> {
    Ok(serde_json::to_string(&CartRecord::from(cart))?)
}

/// Parse a cart from its JSON payload.
///
/// # Errors
///
/// Returns a [`RecordError`] if the payload is malformed or describes an invalid cart.
pub fn decode(payload: &str) -> Result<Cart<'static>, RecordError> {
    let record: CartRecord = serde_json::from_str(payload)?;

    Cart::try_from(record)
}
