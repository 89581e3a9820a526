//! Cart events

use std::fmt;

use crate::products::ProductId;

/// A change applied to the cart by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line was added with quantity one.
    ItemAdded {
        /// Product identifier
        id: ProductId,
        /// Product name
        name: String,
    },

    /// Adding a product already in the cart increased its quantity.
    QuantityIncreased {
        /// Product identifier
        id: ProductId,
        /// Product name
        name: String,
        /// New line quantity
        quantity: u32,
    },

    /// A line quantity was set directly.
    QuantityChanged {
        /// Product identifier
        id: ProductId,
        /// Product name
        name: String,
        /// New line quantity
        quantity: u32,
    },

    /// A line was removed.
    ItemRemoved {
        /// Product identifier
        id: ProductId,
        /// Product name
        name: String,
    },

    /// Every line was removed.
    CartCleared,

    /// Checkout completed and the cart was emptied.
    OrderPlaced,
}

impl CartEvent {
    /// The product the event concerns, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            CartEvent::ItemAdded { id, .. }
            | CartEvent::QuantityIncreased { id, .. }
            | CartEvent::QuantityChanged { id, .. }
            | CartEvent::ItemRemoved { id, .. } => Some(*id),
            CartEvent::CartCleared | CartEvent::OrderPlaced => None,
        }
    }

    /// The message shown to the customer for this event.
    pub fn notification(&self) -> Notification {
        match self {
            CartEvent::ItemAdded { name, .. } => {
                Notification::new("Item added", format!("{name} added to your cart"))
            }
            CartEvent::QuantityIncreased { name, quantity, .. } => Notification::new(
                "Quantity updated",
                format!("{name} quantity increased to {quantity}"),
            ),
            CartEvent::QuantityChanged { name, quantity, .. } => Notification::new(
                "Quantity updated",
                format!("{name} quantity set to {quantity}"),
            ),
            CartEvent::ItemRemoved { name, .. } => {
                Notification::new("Item removed", format!("{name} removed from your cart"))
            }
            CartEvent::CartCleared => Notification::new(
                "Cart cleared",
                "All items have been removed from your cart",
            ),
            CartEvent::OrderPlaced => Notification::new(
                "Order placed successfully!",
                "Check your email for order confirmation.",
            ),
        }
    }
}

/// A short, user-facing message describing a cart change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline
    pub title: &'static str,

    /// Detail line
    pub description: String,
}

impl Notification {
    fn new(title: &'static str, description: impl Into<String>) -> Self {
        Self {
            title,
            description: description.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
