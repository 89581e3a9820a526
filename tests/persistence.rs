//! Cart persistence across store instances using file storage.

use std::fs;

use rusty_money::{Money, iso::USD};
use tempfile::TempDir;
use testresult::TestResult;

use storefront::prelude::*;

fn catalog() -> TestResult<FixtureCatalog> {
    Ok(FixtureCatalog::load(
        concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/catalog"),
        "storefront",
    )?)
}

fn product(catalog: &FixtureCatalog, id: u32) -> TestResult<&Product<'static>> {
    Ok(catalog
        .product(ProductId(id))
        .ok_or_else(|| format!("product {id} missing from fixture"))?)
}

#[test]
fn cart_survives_a_restart() -> TestResult {
    let dir = TempDir::new()?;
    let catalog = catalog()?;
    let config = StoreConfig::default();

    {
        let mut store = CartStore::open(FileStorage::new(dir.path()), &config);

        store.add_item(product(&catalog, 3)?)?;
        store.add_item(product(&catalog, 6)?)?;
        store.add_item(product(&catalog, 6)?)?;
    }

    let store = CartStore::open(FileStorage::new(dir.path()), &config);

    assert_eq!(store.item_count(), 3);
    assert_eq!(store.subtotal()?, Money::from_minor(249_97, USD));
    assert_eq!(
        store.cart().get(ProductId(6)).map(LineItem::quantity),
        Some(2)
    );

    Ok(())
}

#[test]
fn cleared_cart_stays_cleared() -> TestResult {
    let dir = TempDir::new()?;
    let catalog = catalog()?;
    let config = StoreConfig::default();

    let mut store = CartStore::open(FileStorage::new(dir.path()), &config);
    store.add_item(product(&catalog, 1)?)?;
    store.clear_cart();

    let reopened = CartStore::open(FileStorage::new(dir.path()), &config);

    assert!(reopened.cart().is_empty());

    Ok(())
}

#[test]
fn storage_key_selects_the_file() -> TestResult {
    let dir = TempDir::new()?;
    let catalog = catalog()?;
    let config = StoreConfig {
        storage_key: "guest-cart".to_string(),
        ..StoreConfig::default()
    };

    let mut store = CartStore::open(FileStorage::new(dir.path()), &config);
    store.add_item(product(&catalog, 2)?)?;

    let saved = fs::read_to_string(dir.path().join("guest-cart.json"))?;
    let record: CartRecord = serde_json::from_str(&saved)?;

    assert_eq!(record.currency, "USD");
    assert_eq!(record.items.len(), 1);
    assert!(saved.contains("\"price\":\"89.99 USD\""));

    Ok(())
}

#[test]
fn corrupt_file_opens_an_empty_cart() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("cart.json"), "not json")?;

    let store = CartStore::open(FileStorage::new(dir.path()), &StoreConfig::default());

    assert!(store.cart().is_empty());

    Ok(())
}

#[test]
fn checkout_clears_the_saved_cart() -> TestResult {
    let dir = TempDir::new()?;
    let catalog = catalog()?;
    let config = StoreConfig::default();

    let mut store = CartStore::open(FileStorage::new(dir.path()), &config);
    store.add_item(product(&catalog, 7)?)?;

    let order = store.checkout(CheckoutRequest {
        shipping: ShippingMethod::Express,
        payment: PaymentMethod::CreditCard,
        details: ShippingDetails {
            first_name: "Margaret".to_string(),
            last_name: "Hamilton".to_string(),
            email: "margaret@example.com".to_string(),
            street: "3 Apollo Court".to_string(),
            city: "Cambridge".to_string(),
            state: "MA".to_string(),
            zip: "02139".to_string(),
        },
    })?;

    // 65.99 + 15.00 shipping + 4.62 tax
    assert_eq!(order.summary().total, Money::from_minor(85_61, USD));

    let reopened = CartStore::open(FileStorage::new(dir.path()), &config);

    assert!(reopened.cart().is_empty());

    Ok(())
}
