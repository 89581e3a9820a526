//! Pricing
//!
//! Money helpers shared by products, carts and checkout. All arithmetic is done in minor
//! units so line totals and taxes never pick up floating point drift.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{Currency, EUR, GBP, USD},
};
use thiserror::Error;

/// Errors that can occur while parsing or calculating prices.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Price string was not in the `AMOUNT CURRENCY` format.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Percentage string could not be parsed.
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Currency code is not one of the supported ISO currencies.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Minor unit arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Looks up a supported ISO currency by its alpha code.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for anything other than GBP, USD or EUR.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, PricingError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(PricingError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal number, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), PricingError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(PricingError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(PricingError::InvalidPrice(s.to_string()));
    }

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PricingError::InvalidPrice(s.to_string()))?;

    let currency = currency_from_code(currency_code)?;

    Ok((minor_units, currency))
}

/// Parse a price string straight into [`Money`].
///
/// # Errors
///
/// See [`parse_price`].
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, PricingError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Formats money in the same `AMOUNT CURRENCY` shape [`parse_price`] accepts.
pub fn format_price(money: &Money<'_, Currency>) -> String {
    format!(
        "{} {}",
        Decimal::new(money.to_minor_units(), 2),
        money.currency().iso_alpha_code
    )
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a decimal number.
pub fn parse_percentage(s: &str) -> Result<Percentage, PricingError> {
    let trimmed = s.trim();

    let (value, scale) = match trimmed.strip_suffix('%') {
        Some(percent_str) => (percent_str.trim(), Decimal::ONE_HUNDRED),
        None => (trimmed, Decimal::ONE),
    };

    let value = value
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidPercentage(s.to_string()))?;

    Ok(Percentage::from(value / scale))
}

/// Price of `quantity` units at `unit_price`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
pub fn line_total<'a>(
    unit_price: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Sums money values, starting from zero in `currency`.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if any value is in a different currency.
pub fn total_price<'a>(
    amounts: impl IntoIterator<Item = Money<'a, Currency>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    let total = amounts
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, amount| {
            acc.add(amount)
        })?;

    Ok(total)
}

/// Calculate a percentage of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // `Percentage` does not expose its inner `Decimal`
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(PricingError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(PricingError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price("-1.00 USD");

        assert!(matches!(result, Err(PricingError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_accepts_usd_and_eur() -> TestResult {
        let (usd_minor, usd) = parse_price("1.00 USD")?;
        let (eur_minor, eur) = parse_price("2.50 EUR")?;

        assert_eq!(usd_minor, 100);
        assert_eq!(usd, USD);
        assert_eq!(eur_minor, 250);
        assert_eq!(eur, EUR);

        Ok(())
    }

    #[test]
    fn format_price_is_accepted_by_parse_price() -> TestResult {
        let money = Money::from_minor(5_999, USD);

        assert_eq!(format_price(&money), "59.99 USD");
        assert_eq!(parse_money(&format_price(&money))?, money);

        Ok(())
    }

    #[test]
    fn format_price_keeps_trailing_zeroes() {
        assert_eq!(format_price(&Money::from_minor(500, GBP)), "5.00 GBP");
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> TestResult {
        let seven_percent = Percentage::from(Decimal::new(7, 2));

        assert_eq!(parse_percentage("7%")?, seven_percent);
        assert_eq!(parse_percentage(" 0.07 ")?, seven_percent);

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        let result = parse_percentage("seven");

        assert!(matches!(result, Err(PricingError::InvalidPercentage(_))));
    }

    #[test]
    fn line_total_multiplies_minor_units() -> TestResult {
        let total = line_total(&Money::from_minor(1_599, USD), 3)?;

        assert_eq!(total, Money::from_minor(4_797, USD));

        Ok(())
    }

    #[test]
    fn line_total_overflow_returns_error() {
        let result = line_total(&Money::from_minor(i64::MAX, USD), 2);

        assert_eq!(result, Err(PricingError::Overflow));
    }

    #[test]
    fn total_price_of_nothing_is_zero() -> TestResult {
        assert_eq!(total_price([], GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn total_price_rejects_mixed_currencies() {
        let result = total_price(
            [Money::from_minor(100, GBP), Money::from_minor(100, USD)],
            GBP,
        );

        assert!(matches!(result, Err(PricingError::Money(_))));
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        // 7% of 1.50 is 10.5 minor units
        assert_eq!(percent_of_minor(&Percentage::from(Decimal::new(7, 2)), 150)?, 11);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let result = percent_of_minor(&Percentage::from(2.0), i64::MAX);

        assert!(matches!(result, Err(PricingError::PercentConversion)));
    }
}
