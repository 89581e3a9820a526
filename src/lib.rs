//! Storefront
//!
//! Storefront is the cart and pricing core of an online shop: a product catalog, a persistent
//! shopping cart with change notifications, and checkout totals.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod storage;
pub mod store;
