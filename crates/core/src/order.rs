//! Placed orders and order numbers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PricedLine;
use crate::types::{CurrencyCode, OrderId, OrderStatus, PaymentMethod};

/// A line on a placed order: the priced cart line as it was at checkout.
pub type OrderLine = PricedLine;

/// Buyer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
}

/// A placed order.
///
/// Everything except `status` and `updated_at` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub items: Vec<OrderLine>,
    pub contact: Contact,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order is the one a buyer is asking about.
    #[must_use]
    pub fn matches_lookup(&self, order_number: &str, email: &str) -> bool {
        self.order_number == normalize_order_number(order_number)
            && self.contact.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

// =============================================================================
// Order numbers
// =============================================================================

/// Number of base-36 digits after the prefix.
pub const ORDER_NUMBER_DIGITS: usize = 8;

/// Canonical form used for storage and lookup.
#[must_use]
pub fn normalize_order_number(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Uppercase base-36 rendering of `value`.
#[must_use]
pub fn encode_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = usize::try_from(value % 36).unwrap_or_default();
        out.push(DIGITS.get(digit).copied().unwrap_or(b'0'));
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `PREFIX-XXXXXXXX`: the last eight base-36 digits of `value`, zero padded.
#[must_use]
pub fn format_order_number(prefix: &str, value: u64) -> String {
    let encoded = encode_base36(value);
    let tail = encoded
        .get(encoded.len().saturating_sub(ORDER_NUMBER_DIGITS)..)
        .unwrap_or(&encoded);
    format!("{prefix}-{tail:0>ORDER_NUMBER_DIGITS$}")
}

/// Source of the numeric part of order numbers.
pub trait OrderNumberSource: Send + Sync {
    fn next_value(&self) -> u64;
}

/// Milliseconds since the epoch, forced strictly increasing within a process.
#[derive(Debug, Default)]
pub struct ClockOrderNumbers {
    last: AtomicU64,
}

impl ClockOrderNumbers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }
}

impl OrderNumberSource for ClockOrderNumbers {
    fn next_value(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36() {
        assert_eq!(encode_base36(0), "0");
        assert_eq!(encode_base36(35), "Z");
        assert_eq!(encode_base36(36), "10");
        assert_eq!(encode_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_format_takes_last_eight_digits() {
        assert_eq!(format_order_number("OPAL", 35), "OPAL-0000000Z");
        let long = format_order_number("OPAL", u64::MAX);
        assert_eq!(long.len(), "OPAL-".len() + ORDER_NUMBER_DIGITS);
        assert!(long.ends_with(&encode_base36(u64::MAX)[5..]));
    }

    #[test]
    fn test_clock_source_strictly_increases() {
        let source = ClockOrderNumbers::new();
        let mut prev = source.next_value();
        for _ in 0..1000 {
            let next = source.next_value();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_normalize_order_number() {
        assert_eq!(normalize_order_number(" opal-abc123 "), "OPAL-ABC123");
    }
}
