//! Receipt
//!
//! Terminal rendering for carts and placed orders.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, LineItem},
    checkout::{Order, PaymentMethod, ShippingMethod},
    pricing::PricingError,
    products::Product,
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A line total or subtotal could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Write the cart's lines and subtotal.
///
/// # Errors
///
/// Returns an error if a total cannot be calculated or the output cannot be written.
pub fn write_cart(mut out: impl io::Write, cart: &Cart<'_>) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    write_items_table(&mut out, cart.items())?;

    let items = cart.item_count().to_string();
    let subtotal = cart.subtotal()?;

    write_summary(
        &mut out,
        &[(" Items:", items), (" \x1b[1mSubtotal:\x1b[0m", bold(&subtotal))],
    )
}

/// Write a placed order: lines, delivery choices and charged amounts.
///
/// # Errors
///
/// Returns an error if a line total cannot be calculated or the output cannot be written.
pub fn write_order(mut out: impl io::Write, order: &Order<'_>) -> Result<(), ReceiptError> {
    let request = order.request();
    let details = &request.details;

    writeln!(
        out,
        "\nShip to: {} {}, {}, {}, {} {}",
        details.first_name,
        details.last_name,
        details.street,
        details.city,
        details.state,
        details.zip
    )?;
    writeln!(
        out,
        "Shipping: {}  Payment: {}",
        shipping_label(request.shipping),
        payment_label(request.payment)
    )?;

    write_items_table(&mut out, order.items())?;

    let summary = order.summary();

    write_summary(
        &mut out,
        &[
            (" Subtotal:", summary.subtotal.to_string()),
            (" Shipping:", summary.shipping.to_string()),
            (" Tax:", summary.tax.to_string()),
            (" \x1b[1mTotal:\x1b[0m", bold(&summary.total)),
        ],
    )
}

/// Write a product listing.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_products(
    mut out: impl io::Write,
    products: &[&Product<'_>],
) -> Result<(), ReceiptError> {
    if products.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Name", "Category", "Price", "Rating", "Stock"]);

    for product in products {
        let price = match &product.sale {
            Some(sale) => format!("{sale} (was {})", product.price),
            None => product.price.to_string(),
        };

        let name = if product.new {
            format!("{} [new]", product.name)
        } else {
            product.name.clone()
        };

        let stock = if product.in_stock() {
            product.stock.to_string()
        } else {
            "sold out".to_string()
        };

        builder.push_record([
            product.id.0.to_string(),
            name,
            product.category.clone(),
            price,
            format!("{} ({})", product.rating, product.reviews),
            stock,
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

fn write_items_table(out: &mut impl io::Write, items: &[LineItem<'_>]) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Qty", "Unit Price", "Line Total"]);

    for (idx, item) in items.iter().enumerate() {
        let product = item.product();

        let unit_price = match &product.sale {
            Some(sale) => format!("{sale} (was {})", product.price),
            None => product.price.to_string(),
        };

        builder.push_record([
            format!("#{:<3}", idx + 1),
            product.name.clone(),
            item.quantity().to_string(),
            unit_price,
            item.line_total()?.to_string(),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

fn write_summary(out: &mut impl io::Write, lines: &[(&str, String)]) -> Result<(), ReceiptError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value) + 2)
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        write_summary_line(out, label, &format!("{value}  "), label_width, value_width)?;
    }

    writeln!(out)?;

    Ok(())
}

fn bold(money: &Money<'_, Currency>) -> String {
    format!("\x1b[1m{money}\x1b[0m")
}

fn shipping_label(method: ShippingMethod) -> &'static str {
    match method {
        ShippingMethod::Standard => "Standard",
        ShippingMethod::Express => "Express",
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CreditCard => "Credit card",
        PaymentMethod::PayPal => "PayPal",
    }
}

/// Width of `s` on screen, ignoring ANSI escape sequences.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )?;

    Ok(())
}
