//! Checkout
//!
//! Prices a cart for delivery and turns it into an [`Order`]. Payment is only recorded,
//! never processed.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::{Cart, LineItem},
    pricing::{PricingError, percent_of_minor, total_price},
};

/// Errors that prevent an order from being placed. The cart is unchanged when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A required shipping field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email address is not usable.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Totals could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Delivery speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ShippingMethod {
    /// Standard delivery
    #[default]
    Standard,

    /// Express delivery
    Express,
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PaymentMethod {
    /// Card payment
    #[default]
    CreditCard,

    /// `PayPal`
    #[value(name = "paypal")]
    PayPal,
}

/// Checkout rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutConfig {
    /// Sales tax applied to the subtotal
    pub tax_rate: Percentage,

    /// Standard delivery charge
    pub standard_shipping: Money<'static, Currency>,

    /// Express delivery charge
    pub express_shipping: Money<'static, Currency>,
}

impl CheckoutConfig {
    /// Default rates in `currency`: 7% tax, 5.00 standard and 15.00 express shipping.
    pub fn for_currency(currency: &'static Currency) -> Self {
        Self {
            tax_rate: Percentage::from(Decimal::new(7, 2)),
            standard_shipping: Money::from_minor(5_00, currency),
            express_shipping: Money::from_minor(15_00, currency),
        }
    }

    /// Delivery charge for a shipping method.
    pub fn shipping_cost(&self, method: ShippingMethod) -> Money<'static, Currency> {
        match method {
            ShippingMethod::Standard => self.standard_shipping,
            ShippingMethod::Express => self.express_shipping,
        }
    }
}

/// Amounts charged for an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSummary<'a> {
    /// Sum of line totals
    pub subtotal: Money<'a, Currency>,

    /// Delivery charge
    pub shipping: Money<'a, Currency>,

    /// Tax on the subtotal
    pub tax: Money<'a, Currency>,

    /// Subtotal plus shipping plus tax
    pub total: Money<'a, Currency>,
}

impl<'a> OrderSummary<'a> {
    /// Price a cart for the given shipping method.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the subtotal does not fit in minor units, or a
    /// [`PricingError::Money`] if the configured rates are in a different currency to the cart.
    pub fn for_cart(
        cart: &Cart<'a>,
        shipping: ShippingMethod,
        config: &CheckoutConfig,
    ) -> Result<Self, PricingError> {
        let subtotal = cart.subtotal()?;
        let shipping = config.shipping_cost(shipping);

        let subtotal_minor = subtotal
            .try_to_minor_units()
            .map_err(|_err| PricingError::Overflow)?;

        let tax_minor = percent_of_minor(&config.tax_rate, subtotal_minor)?;
        let tax = Money::from_minor(tax_minor, cart.currency());

        let total = total_price([subtotal, shipping, tax], cart.currency())?;

        Ok(Self {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}

/// Delivery and contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingDetails {
    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Contact email
    pub email: String,

    /// Street address
    pub street: String,

    /// City
    pub city: String,

    /// State or region
    pub state: String,

    /// ZIP or postal code
    pub zip: String,
}

impl ShippingDetails {
    /// Check every field is filled in and the email looks like an address.
    ///
    /// # Errors
    ///
    /// Returns the first blank field as [`CheckoutError::MissingField`], or
    /// [`CheckoutError::InvalidEmail`].
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("street address", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip code", &self.zip),
        ];

        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CheckoutError::MissingField(*name));
        }

        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

        if !valid_email {
            return Err(CheckoutError::InvalidEmail(email.to_string()));
        }

        Ok(())
    }
}

/// Everything the customer chose at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Delivery speed
    pub shipping: ShippingMethod,

    /// Payment method
    pub payment: PaymentMethod,

    /// Delivery and contact details
    pub details: ShippingDetails,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<'a> {
    items: Vec<LineItem<'a>>,
    request: CheckoutRequest,
    summary: OrderSummary<'a>,
}

impl<'a> Order<'a> {
    /// Build an order from the cart contents.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart, a validation error for the
    /// shipping details, or a pricing error.
    pub fn place(
        cart: &Cart<'a>,
        request: CheckoutRequest,
        config: &CheckoutConfig,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        request.details.validate()?;

        let summary = OrderSummary::for_cart(cart, request.shipping, config)?;

        Ok(Self {
            items: cart.items().to_vec(),
            request,
            summary,
        })
    }

    /// Ordered lines
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Choices made at checkout
    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }

    /// Charged amounts
    pub fn summary(&self) -> &OrderSummary<'a> {
        &self.summary
    }

    /// Sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }
}
