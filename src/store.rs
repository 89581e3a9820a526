//! Cart Store
//!
//! The single source of truth for a session's cart. Every successful mutation is applied in
//! memory, written through the configured [`CartStorage`], then announced to subscribers, all
//! before the call returns. Storage failures are logged and never reach the caller; the
//! in-memory cart stays authoritative for the life of the store.

use std::{fmt, num::NonZeroU32};

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, warn};

use crate::{
    cart::{
        Cart, CartError, LineItem, StockPolicy,
        events::CartEvent,
        records::{self, RecordError},
    },
    checkout::{CheckoutConfig, CheckoutError, CheckoutRequest, Order},
    config::StoreConfig,
    pricing::PricingError,
    products::{Product, ProductId},
    storage::{CartStorage, MemoryStorage},
};

new_key_type! {
    /// Handle returned by [`CartStore::subscribe`].
    pub struct SubscriptionKey;
}

type Subscriber<'a> = Box<dyn FnMut(&Cart<'a>, &CartEvent) + 'a>;

/// Shopping cart store
pub struct CartStore<'a, S: CartStorage = MemoryStorage> {
    cart: Cart<'a>,
    storage: S,
    storage_key: String,
    stock_policy: StockPolicy,
    checkout_config: CheckoutConfig,
    subscribers: SlotMap<SubscriptionKey, Subscriber<'a>>,
}

impl<S: CartStorage + fmt::Debug> fmt::Debug for CartStore<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("storage", &self.storage)
            .field("storage_key", &self.storage_key)
            .field("stock_policy", &self.stock_policy)
            .field("checkout_config", &self.checkout_config)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<'a, S: CartStorage> CartStore<'a, S> {
    /// Open the store, restoring any cart saved under the configured key.
    ///
    /// A missing, unreadable or corrupt saved cart results in an empty cart.
    pub fn open(storage: S, config: &StoreConfig) -> Self {
        let cart = restore(&storage, config).unwrap_or_else(|| Cart::new(config.currency));

        debug!(
            key = %config.storage_key,
            lines = cart.len(),
            items = cart.item_count(),
            "cart store opened"
        );

        Self {
            cart,
            storage,
            storage_key: config.storage_key.clone(),
            stock_policy: config.stock_policy,
            checkout_config: config.checkout,
            subscribers: SlotMap::with_key(),
        }
    }

    /// Current cart
    pub fn cart(&self) -> &Cart<'a> {
        &self.cart
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        self.cart.items()
    }

    /// Sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Sum of all line totals at effective prices.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        self.cart.subtotal()
    }

    /// Stock enforcement in effect.
    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Checkout rates in effect.
    pub fn checkout_config(&self) -> &CheckoutConfig {
        &self.checkout_config
    }

    /// Backing storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register a callback run after every change.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&Cart<'a>, &CartEvent) + 'a,
    ) -> SubscriptionKey {
        self.subscribers.insert(Box::new(subscriber))
    }

    /// Remove a callback. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        self.subscribers.remove(key).is_some()
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the product cannot be added; nothing is saved or announced.
    pub fn add_item(&mut self, product: &Product<'a>) -> Result<CartEvent, CartError> {
        let quantity = self.cart.add(product, self.stock_policy)?;

        let event = if quantity == 1 {
            CartEvent::ItemAdded {
                id: product.id,
                name: product.name.clone(),
            }
        } else {
            CartEvent::QuantityIncreased {
                id: product.id,
                name: product.name.clone(),
                quantity,
            }
        };

        Ok(self.commit(event))
    }

    /// Remove a product's line. Unknown products are ignored.
    pub fn remove_item(&mut self, id: ProductId) -> Option<CartEvent> {
        let removed = self.cart.remove(id)?;

        Some(self.commit(CartEvent::ItemRemoved {
            id,
            name: removed.product().name.clone(),
        }))
    }

    /// Set a line's quantity. Zero removes the line; unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if the stock policy rejects the quantity.
    pub fn update_quantity(
        &mut self,
        id: ProductId,
        quantity: u32,
    ) -> Result<Option<CartEvent>, CartError> {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return Ok(self.remove_item(id));
        };

        let Some(item) = self.cart.set_quantity(id, quantity, self.stock_policy)? else {
            return Ok(None);
        };

        let event = CartEvent::QuantityChanged {
            id,
            name: item.product().name.clone(),
            quantity: item.quantity(),
        };

        Ok(Some(self.commit(event)))
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) -> CartEvent {
        self.cart.clear();

        self.commit(CartEvent::CartCleared)
    }

    /// Place an order for the cart contents and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the order cannot be placed; the cart is left as it was.
    pub fn checkout(&mut self, request: CheckoutRequest) -> Result<Order<'a>, CheckoutError> {
        let order = Order::place(&self.cart, request, &self.checkout_config)?;

        self.cart.clear();
        self.commit(CartEvent::OrderPlaced);

        Ok(order)
    }

    fn commit(&mut self, event: CartEvent) -> CartEvent {
        debug!(
            ?event,
            lines = self.cart.len(),
            items = self.cart.item_count(),
            "cart changed"
        );

        self.persist();

        for subscriber in self.subscribers.values_mut() {
            subscriber(&self.cart, &event);
        }

        event
    }

    fn persist(&mut self) {
        let payload = match records::encode(&self.cart) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "failed to serialize cart");
                return;
            }
        };

        if let Err(error) = self.storage.save(&self.storage_key, &payload) {
            warn!(%error, key = %self.storage_key, "failed to save cart");
        }
    }
}

fn restore<S: CartStorage>(storage: &S, config: &StoreConfig) -> Option<Cart<'static>> {
    let payload = match storage.load(&config.storage_key) {
        Ok(payload) => payload?,
        Err(error) => {
            warn!(%error, key = %config.storage_key, "failed to load saved cart");
            return None;
        }
    };

    let cart = match records::decode(&payload) {
        Ok(cart) if cart.currency() == config.currency => cart,
        Ok(cart) => {
            let error = RecordError::CurrencyMismatch(
                config.currency.iso_alpha_code.to_string(),
                cart.currency().iso_alpha_code.to_string(),
            );

            warn!(%error, key = %config.storage_key, "discarding saved cart");
            return None;
        }
        Err(error) => {
            warn!(%error, key = %config.storage_key, "discarding saved cart");
            return None;
        }
    };

    // A restored line must satisfy the same stock policy as a fresh one.
    let within_stock = cart
        .items()
        .iter()
        .try_for_each(|item| config.stock_policy.check(item.product(), item.quantity()));

    if let Err(error) = within_stock {
        warn!(%error, key = %config.storage_key, "discarding saved cart");
        return None;
    }

    Some(cart)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rust_decimal::Decimal;
    use rusty_money::iso::USD;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        checkout::ShippingDetails,
        storage::{MemoryStorage, StorageError},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        fn save(&mut self, key: &str, _payload: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    fn product(id: u32, price: i64, sale: Option<i64>) -> Product<'static> {
        Product {
            id: ProductId(id),
            name: format!("Product {id}"),
            description: String::new(),
            category: "shoes".to_string(),
            price: Money::from_minor(price, USD),
            sale: sale.map(|minor| Money::from_minor(minor, USD)),
            stock: 10,
            images: smallvec![],
            rating: Decimal::ZERO,
            reviews: 0,
            new: false,
        }
    }

    fn store() -> CartStore<'static> {
        CartStore::open(MemoryStorage::new(), &StoreConfig::default())
    }

    #[test]
    fn add_item_emits_added_then_increased() -> TestResult {
        let mut store = store();
        let sneakers = product(6, 79_99, Some(59_99));

        assert_eq!(
            store.add_item(&sneakers)?,
            CartEvent::ItemAdded {
                id: ProductId(6),
                name: "Product 6".to_string(),
            }
        );

        assert_eq!(
            store.add_item(&sneakers)?,
            CartEvent::QuantityIncreased {
                id: ProductId(6),
                name: "Product 6".to_string(),
                quantity: 2,
            }
        );

        Ok(())
    }

    #[test]
    fn mutations_are_written_through() -> TestResult {
        let mut store = store();

        store.add_item(&product(1, 10_00, None))?;

        let saved = store.storage().get("cart").ok_or("cart should be saved")?;

        assert_eq!(records::decode(saved)?, *store.cart());

        Ok(())
    }

    #[test]
    fn remove_unknown_item_is_silent() {
        let mut store = store();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);

        store.subscribe(move |_, _| *counter.borrow_mut() += 1);

        assert_eq!(store.remove_item(ProductId(42)), None);
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(store.storage().get("cart"), None);
    }

    #[test]
    fn update_quantity_to_zero_removes_line() -> TestResult {
        let mut store = store();

        store.add_item(&product(1, 10_00, None))?;

        let event = store.update_quantity(ProductId(1), 0)?;

        assert_eq!(
            event,
            Some(CartEvent::ItemRemoved {
                id: ProductId(1),
                name: "Product 1".to_string(),
            })
        );
        assert!(!store.cart().contains(ProductId(1)));

        Ok(())
    }

    #[test]
    fn update_quantity_of_unknown_item_is_none() -> TestResult {
        let mut store = store();

        assert_eq!(store.update_quantity(ProductId(3), 4)?, None);

        Ok(())
    }

    #[test]
    fn rejected_add_is_not_saved_or_announced() -> TestResult {
        let mut store = store();
        let mut scarce = product(2, 10_00, None);
        scarce.stock = 1;

        store.add_item(&scarce)?;

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |_, event| sink.borrow_mut().push(event.clone()));

        let saved_before = store.storage().get("cart").map(str::to_string);
        let result = store.add_item(&scarce);

        assert!(matches!(result, Err(CartError::InsufficientStock { .. })));
        assert!(events.borrow().is_empty());
        assert_eq!(store.storage().get("cart").map(str::to_string), saved_before);
        assert_eq!(store.item_count(), 1);

        Ok(())
    }

    #[test]
    fn subscribers_see_the_updated_cart() -> TestResult {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        store.subscribe(move |cart, event| {
            sink.borrow_mut()
                .push((cart.item_count(), event.notification().title));
        });

        store.add_item(&product(1, 10_00, None))?;
        store.add_item(&product(1, 10_00, None))?;
        store.clear_cart();

        assert_eq!(
            *seen.borrow(),
            [
                (1, "Item added"),
                (2, "Quantity updated"),
                (0, "Cart cleared")
            ]
        );

        Ok(())
    }

    #[test]
    fn unsubscribed_callbacks_are_not_called() -> TestResult {
        let mut store = store();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);

        let key = store.subscribe(move |_, _| *counter.borrow_mut() += 1);

        store.add_item(&product(1, 10_00, None))?;

        assert!(store.unsubscribe(key));
        assert!(!store.unsubscribe(key));

        store.add_item(&product(1, 10_00, None))?;

        assert_eq!(*calls.borrow(), 1);

        Ok(())
    }

    #[test]
    fn broken_storage_does_not_affect_the_session() -> TestResult {
        let mut store = CartStore::open(BrokenStorage, &StoreConfig::default());

        store.add_item(&product(1, 10_00, None))?;
        store.add_item(&product(2, 20_00, Some(15_00)))?;

        assert_eq!(store.item_count(), 2);
        assert_eq!(store.subtotal()?, Money::from_minor(25_00, USD));

        Ok(())
    }

    #[test]
    fn corrupt_saved_cart_opens_empty() {
        let storage = MemoryStorage::with_entry("cart", "{\"currency\":\"USD\",\"items\":[");
        let store = CartStore::open(storage, &StoreConfig::default());

        assert!(store.cart().is_empty());
    }

    #[test]
    fn saved_cart_in_other_currency_opens_empty() {
        let storage = MemoryStorage::with_entry("cart", r#"{"currency":"GBP","items":[]}"#);
        let store = CartStore::open(storage, &StoreConfig::default());

        assert!(store.cart().is_empty());
        assert_eq!(store.cart().currency(), USD);
    }

    #[test]
    fn saved_cart_above_stock_opens_empty() -> TestResult {
        let mut cart = Cart::new(USD);
        let boots = product(5, 189_99, None);

        for _ in 0..99 {
            cart.add(&boots, StockPolicy::Unchecked)?;
        }

        let storage = MemoryStorage::with_entry("cart", records::encode(&cart)?);
        let mut store = CartStore::open(storage, &StoreConfig::default());

        assert!(store.cart().is_empty());
        assert_eq!(store.add_item(&boots)?.notification().title, "Item added");

        Ok(())
    }

    #[test]
    fn saved_cart_above_stock_is_kept_when_unchecked() -> TestResult {
        let mut cart = Cart::new(USD);
        let mut boots = product(5, 189_99, None);
        boots.stock = 1;

        cart.add(&boots, StockPolicy::Enforce)?;
        cart.add(&boots, StockPolicy::Unchecked)?;

        let config = StoreConfig {
            stock_policy: StockPolicy::Unchecked,
            ..StoreConfig::default()
        };
        let store: CartStore<'static> =
            CartStore::open(MemoryStorage::with_entry("cart", records::encode(&cart)?), &config);

        assert_eq!(store.item_count(), 2);

        Ok(())
    }

    #[test]
    fn checkout_empties_cart_and_announces_order() -> TestResult {
        let mut store = store();
        let titles = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&titles);

        store.add_item(&product(1, 100_00, None))?;
        store.subscribe(move |_, event| sink.borrow_mut().push(event.notification().title));

        let order = store.checkout(CheckoutRequest {
            details: ShippingDetails {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: "grace@example.com".to_string(),
                street: "1 Harbor Way".to_string(),
                city: "Arlington".to_string(),
                state: "VA".to_string(),
                zip: "22201".to_string(),
            },
            ..CheckoutRequest::default()
        })?;

        assert_eq!(order.summary().total, Money::from_minor(112_00, USD));
        assert!(store.cart().is_empty());
        assert_eq!(*titles.borrow(), ["Order placed successfully!"]);

        Ok(())
    }

    #[test]
    fn failed_checkout_keeps_the_cart() -> TestResult {
        let mut store = store();

        store.add_item(&product(1, 100_00, None))?;

        let result = store.checkout(CheckoutRequest::default());

        assert_eq!(result, Err(CheckoutError::MissingField("first name")));
        assert_eq!(store.item_count(), 1);

        Ok(())
    }
}
