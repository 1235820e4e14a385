//! Turning a priced cart into a stored order.
//!
//! The [`OrderMaterializer`] re-validates buyer input, recomputes the total,
//! assigns a unique order number and writes the order. It never touches the
//! cart; callers clear it only after [`OrderMaterializer::create_order`]
//! returns `Ok`.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::order::{
    ClockOrderNumbers, Contact, Order, OrderLine, OrderNumberSource, ShippingAddress,
    format_order_number,
};
use crate::store::{OrderStore, StoreError};
use crate::types::{CurrencyCode, Email, OrderId, OrderStatus, PaymentMethod};

/// Attempts at finding an unused order number before giving up.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Errors that can occur while placing an order.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Buyer input failed validation.
    #[error("{0}")]
    Validation(String),

    #[error("order has no items")]
    EmptyOrder,

    /// Every generated order number was already taken.
    #[error("could not allocate a unique order number after {attempts} attempts")]
    OrderNumberExhausted { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Whether the buyer can simply try again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OrderNumberExhausted { .. } | Self::Store(StoreError::Unavailable(_))
        )
    }
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub contact: Contact,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub currency: CurrencyCode,
}

/// Identifiers of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub order_number: String,
}

/// Creates orders with store-prefixed, collision-checked order numbers.
#[derive(Debug)]
pub struct OrderMaterializer<N = ClockOrderNumbers> {
    prefix: String,
    numbers: N,
}

impl OrderMaterializer<ClockOrderNumbers> {
    /// Materializer numbering orders from the system clock.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_source(prefix, ClockOrderNumbers::new())
    }
}

impl<N: OrderNumberSource> OrderMaterializer<N> {
    #[must_use]
    pub fn with_source(prefix: impl Into<String>, numbers: N) -> Self {
        Self {
            prefix: prefix.into().trim().to_ascii_uppercase(),
            numbers,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Validate, number and store a new order.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `EmptyOrder` for bad input (nothing is
    /// written), `OrderNumberExhausted` if no unused number was found, or the
    /// store error from the write.
    #[tracing::instrument(skip(self, store, input), fields(items = input.items.len()))]
    pub async fn create_order<S: OrderStore + ?Sized>(
        &self,
        store: &S,
        input: NewOrder,
    ) -> Result<PlacedOrder, CheckoutError> {
        let contact = validate(&input)?;
        let total = input.subtotal + input.shipping_cost;
        let now = Utc::now();

        let mut order = Order {
            id: OrderId::generate(),
            order_number: String::new(),
            items: input.items,
            contact,
            shipping_address: trimmed_address(&input.shipping_address),
            payment_method: input.payment_method,
            subtotal: input.subtotal,
            shipping_cost: input.shipping_cost,
            total,
            currency: input.currency,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let candidate = format_order_number(&self.prefix, self.numbers.next_value());
            if store.order_number_exists(&candidate).await? {
                tracing::debug!(attempt, order_number = %candidate, "Order number taken, regenerating");
                continue;
            }

            order.order_number = candidate;
            match store.insert_order(&order).await {
                Ok(()) => {
                    tracing::info!(
                        order_number = %order.order_number,
                        total = %order.total,
                        "Order created"
                    );
                    return Ok(PlacedOrder {
                        order_id: order.id,
                        order_number: order.order_number,
                    });
                }
                // Another checkout took the number between the check and the insert.
                Err(StoreError::Conflict(reason)) => {
                    tracing::debug!(attempt, %reason, "Order number conflict on insert, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            attempts = MAX_ORDER_NUMBER_ATTEMPTS,
            "Failed to allocate a unique order number"
        );
        Err(CheckoutError::OrderNumberExhausted {
            attempts: MAX_ORDER_NUMBER_ATTEMPTS,
        })
    }
}

fn validate(input: &NewOrder) -> Result<Contact, CheckoutError> {
    if input.contact.email.trim().is_empty() {
        return Err(CheckoutError::Validation("Email is required".to_owned()));
    }
    let email = Email::parse(&input.contact.email)
        .map_err(|e| CheckoutError::Validation(format!("Invalid email: {e}")))?;

    let phone = input.contact.phone.trim();
    if phone.is_empty() {
        return Err(CheckoutError::Validation("Phone is required".to_owned()));
    }
    if input.shipping_address.address.trim().is_empty() {
        return Err(CheckoutError::Validation(
            "Shipping address is required".to_owned(),
        ));
    }
    if input.items.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    if input.items.iter().any(|line| line.quantity == 0) {
        return Err(CheckoutError::Validation(
            "Item quantities must be at least 1".to_owned(),
        ));
    }
    if input.subtotal.is_sign_negative() || input.shipping_cost.is_sign_negative() {
        return Err(CheckoutError::Validation(
            "Order amounts cannot be negative".to_owned(),
        ));
    }

    Ok(Contact {
        email: email.into_inner(),
        phone: phone.to_owned(),
    })
}

fn trimmed_address(address: &ShippingAddress) -> ShippingAddress {
    ShippingAddress {
        address: address.address.trim().to_owned(),
        city: address.city.trim().to_owned(),
        state: address.state.trim().to_owned(),
        postal_code: address.postal_code.trim().to_owned(),
    }
}
