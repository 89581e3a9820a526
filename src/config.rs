//! Store configuration
//!
//! Read from a YAML file; every field is optional.
//!
//! ```yaml
//! storage_key: cart
//! currency: USD
//! stock_policy: enforce
//! tax_rate: 7%
//! standard_shipping: 5.00 USD
//! express_shipping: 15.00 USD
//! ```

use std::{fs, path::Path};

use rusty_money::{
    Money,
    iso::{Currency, USD},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::StockPolicy,
    checkout::CheckoutConfig,
    pricing::{PricingError, currency_from_code, parse_money, parse_percentage},
};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "cart";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A price, percentage or currency could not be parsed
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A shipping rate is in a different currency to the store
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Storage key is blank
    #[error("storage_key must not be empty")]
    EmptyStorageKey,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Key the cart is persisted under
    pub storage_key: String,

    /// Cart currency
    pub currency: &'static Currency,

    /// Stock limit enforcement
    pub stock_policy: StockPolicy,

    /// Checkout rates
    pub checkout: CheckoutConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            currency: USD,
            stock_policy: StockPolicy::default(),
            checkout: CheckoutConfig::for_currency(USD),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not describe a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or describes an invalid configuration.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: ConfigFile = serde_norway::from_str(contents)?;

        file.try_into()
    }
}

/// Raw configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    storage_key: Option<String>,
    currency: Option<String>,
    stock_policy: Option<StockPolicy>,
    tax_rate: Option<String>,
    standard_shipping: Option<String>,
    express_shipping: Option<String>,
}

impl TryFrom<ConfigFile> for StoreConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let storage_key = file
            .storage_key
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        if storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        let currency = file
            .currency
            .as_deref()
            .map_or(Ok(USD), currency_from_code)?;

        let mut checkout = CheckoutConfig::for_currency(currency);

        if let Some(tax_rate) = file.tax_rate.as_deref() {
            checkout.tax_rate = parse_percentage(tax_rate)?;
        }

        if let Some(rate) = file.standard_shipping.as_deref() {
            checkout.standard_shipping = shipping_rate(rate, currency)?;
        }

        if let Some(rate) = file.express_shipping.as_deref() {
            checkout.express_shipping = shipping_rate(rate, currency)?;
        }

        Ok(StoreConfig {
            storage_key,
            currency,
            stock_policy: file.stock_policy.unwrap_or_default(),
            checkout,
        })
    }
}

fn shipping_rate(
    rate: &str,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, ConfigError> {
    let money = parse_money(rate)?;

    if money.currency() != currency {
        return Err(ConfigError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            money.currency().iso_alpha_code.to_string(),
        ));
    }

    Ok(money)
}
