//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartError, LineItem, StockPolicy,
        events::{CartEvent, Notification},
        records::{CartRecord, LineItemRecord, RecordError},
    },
    catalog::{Catalog, CatalogError, Category, FixtureCatalog},
    checkout::{
        CheckoutConfig, CheckoutError, CheckoutRequest, Order, OrderSummary, PaymentMethod,
        ShippingDetails, ShippingMethod,
    },
    config::{ConfigError, DEFAULT_STORAGE_KEY, StoreConfig},
    pricing::PricingError,
    products::{Product, ProductError, ProductId, ProductRecord},
    receipt::{ReceiptError, write_cart, write_order, write_products},
    storage::{CartStorage, FileStorage, MemoryStorage, StorageError},
    store::{CartStore, SubscriptionKey},
};
