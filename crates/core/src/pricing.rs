//! Cart pricing against a catalog snapshot.
//!
//! Everything here is pure computation over already-fetched data. Fetching the
//! catalog and settings is the caller's concern.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartEntry, MAX_LINE_QUANTITY};
use crate::catalog::Product;
use crate::settings::StoreSettings;
use crate::types::{CurrencyCode, ProductId};

/// Product lookup by id.
pub type CatalogSnapshot = HashMap<ProductId, Product>;

/// Index a product list by id.
#[must_use]
pub fn index_products(products: impl IntoIterator<Item = Product>) -> CatalogSnapshot {
    products.into_iter().map(|p| (p.id.clone(), p)).collect()
}

/// A cart line with its resolved price.
///
/// Orders store these verbatim, so catalog edits never reach placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_subtotal: Decimal,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub currency: CurrencyCode,
}

/// Priced lines and their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
}

impl PricedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency of the first line, if any.
    #[must_use]
    pub fn currency(&self) -> Option<CurrencyCode> {
        self.lines.first().map(|line| line.currency)
    }
}

/// Unit price for a product with an optional size selected.
///
/// A size-specific price wins over everything. Otherwise a discount applies
/// only when it is lower than the base price.
#[must_use]
pub fn resolve_unit_price(product: &Product, size: Option<&str>) -> Decimal {
    if let Some(price) = size.and_then(|s| product.size_prices.get(s)) {
        return *price;
    }
    match product.discount_price {
        Some(discount) if discount < product.price => discount,
        _ => product.price,
    }
}

/// Clamp a quantity into `1..=MAX_LINE_QUANTITY`.
#[must_use]
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_LINE_QUANTITY)
}

/// Price every cart entry whose product still exists.
///
/// Entries for products missing from the snapshot are dropped.
#[must_use]
pub fn price_cart(catalog: &CatalogSnapshot, entries: &[CartEntry]) -> PricedCart {
    let lines: Vec<PricedLine> = entries
        .iter()
        .filter_map(|entry| {
            let Some(product) = catalog.get(&entry.product_id) else {
                tracing::debug!(product_id = %entry.product_id, "Dropping cart line for missing product");
                return None;
            };
            Some(price_line(product, entry))
        })
        .collect();

    let subtotal = lines.iter().map(|line| line.line_subtotal).sum();
    PricedCart { lines, subtotal }
}

fn price_line(product: &Product, entry: &CartEntry) -> PricedLine {
    let unit_price = resolve_unit_price(product, entry.size.as_deref());
    let quantity = clamp_quantity(entry.quantity);
    PricedLine {
        product_id: product.id.clone(),
        title: product.title.clone(),
        unit_price,
        quantity,
        line_subtotal: unit_price * Decimal::from(quantity),
        thumbnail: product.thumbnail.clone(),
        color: entry.color.clone(),
        size: entry.size.clone(),
        currency: product.currency,
    }
}

/// Shipping for a subtotal.
///
/// A threshold of exactly zero means shipping is always free. Otherwise
/// shipping is free once the subtotal reaches the threshold.
#[must_use]
pub fn shipping_cost(subtotal: Decimal, flat_cost: Decimal, threshold: Decimal) -> Decimal {
    if threshold.is_zero() || subtotal >= threshold {
        Decimal::ZERO
    } else {
        flat_cost
    }
}

/// Totals shown at checkout and recorded on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl CheckoutSummary {
    #[must_use]
    pub fn for_cart(cart: &PricedCart, settings: &StoreSettings) -> Self {
        let shipping = shipping_cost(
            cart.subtotal,
            settings.shipping_cost,
            settings.free_shipping_threshold,
        );
        Self {
            subtotal: cart.subtotal,
            shipping_cost: shipping,
            total: cart.subtotal + shipping,
            currency: cart.currency().unwrap_or(settings.currency),
        }
    }
}
