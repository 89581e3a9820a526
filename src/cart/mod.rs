//! Cart
//!
//! An ordered list of line items, at most one per product, in a single currency. The cart
//! itself knows nothing about persistence or notifications; see [`crate::store::CartStore`].

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    pricing::{PricingError, line_total},
    products::{Product, ProductId},
};

pub mod events;
pub mod records;

/// Errors for cart mutations that were rejected. The cart is unchanged when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The product is priced in a different currency to the cart.
    #[error("{name} has currency {product}, but cart has currency {cart}")]
    CurrencyMismatch {
        /// Product name
        name: String,
        /// Product currency code
        product: &'static str,
        /// Cart currency code
        cart: &'static str,
    },

    /// The requested quantity is more than the product has in stock.
    #[error("only {stock} of {name} available, {requested} requested")]
    InsufficientStock {
        /// Product identifier
        id: ProductId,
        /// Product name
        name: String,
        /// Requested line quantity
        requested: u32,
        /// Units in stock
        stock: u32,
    },

    /// The line quantity cannot be represented.
    #[error("quantity of product {0} overflowed")]
    QuantityOverflow(ProductId),
}

/// Where stock limits are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Reject quantities above the product's stock.
    #[default]
    Enforce,

    /// Accept any quantity.
    Unchecked,
}

impl StockPolicy {
    /// Checks a requested line quantity against the product's stock.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] when enforcing and `requested` exceeds stock.
    pub fn check(self, product: &Product<'_>, requested: u32) -> Result<(), CartError> {
        match self {
            StockPolicy::Enforce if requested > product.stock => {
                Err(CartError::InsufficientStock {
                    id: product.id,
                    name: product.name.clone(),
                    requested,
                    stock: product.stock,
                })
            }
            StockPolicy::Enforce | StockPolicy::Unchecked => Ok(()),
        }
    }
}

/// A product snapshot paired with a purchase quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    product: Product<'a>,
    quantity: NonZeroU32,
}

impl<'a> LineItem<'a> {
    /// Create a line item.
    pub fn new(product: Product<'a>, quantity: NonZeroU32) -> Self {
        Self { product, quantity }
    }

    /// Product identifier
    pub fn id(&self) -> ProductId {
        self.product.id
    }

    /// Product snapshot taken when the line was created.
    pub fn product(&self) -> &Product<'a> {
        &self.product
    }

    /// Quantity, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Effective unit price.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        self.product.effective_price()
    }

    /// Effective unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total cannot be represented.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, PricingError> {
        line_total(self.unit_price(), self.quantity())
    }
}

/// Cart
#[derive(Debug, Clone, PartialEq)]
pub struct Cart<'a> {
    items: Vec<LineItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Find the line item for a product.
    pub fn get(&self, id: ProductId) -> Option<&LineItem<'a>> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether the cart has a line for the product.
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Number of line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Sum of all line totals, zero when the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        self.items
            .iter()
            .try_fold(Money::from_minor(0, self.currency), |acc, item| {
                Ok(acc.add(item.line_total()?)?)
            })
    }

    /// Add one unit of `product`, returning the new line quantity.
    ///
    /// The existing line is incremented when the product is already in the cart, otherwise a
    /// new line is appended. Stock is checked against `product`, and an existing line takes
    /// its stock level; the line keeps the price it was added at.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] and leaves the cart unchanged if the product currency differs,
    /// the quantity would overflow, or `policy` rejects the new quantity.
    pub fn add(&mut self, product: &Product<'a>, policy: StockPolicy) -> Result<u32, CartError> {
        if product.currency() != self.currency {
            return Err(CartError::CurrencyMismatch {
                name: product.name.clone(),
                product: product.currency().iso_alpha_code,
                cart: self.currency.iso_alpha_code,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|item| item.id() == product.id) {
            let quantity = item
                .quantity
                .checked_add(1)
                .ok_or(CartError::QuantityOverflow(product.id))?;

            policy.check(product, quantity.get())?;
            item.product.stock = product.stock;
            item.quantity = quantity;

            return Ok(quantity.get());
        }

        policy.check(product, 1)?;
        self.items.push(LineItem::new(product.clone(), NonZeroU32::MIN));

        Ok(1)
    }

    /// Remove the line for a product, returning it if present.
    pub fn remove(&mut self, id: ProductId) -> Option<LineItem<'a>> {
        let position = self.items.iter().position(|item| item.id() == id)?;

        Some(self.items.remove(position))
    }

    /// Set the quantity of an existing line.
    ///
    /// Returns `Ok(None)` when the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if `policy` rejects the quantity.
    pub fn set_quantity(
        &mut self,
        id: ProductId,
        quantity: NonZeroU32,
        policy: StockPolicy,
    ) -> Result<Option<&LineItem<'a>>, CartError> {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return Ok(None);
        };

        policy.check(&item.product, quantity.get())?;
        item.quantity = quantity;

        Ok(Some(item))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
