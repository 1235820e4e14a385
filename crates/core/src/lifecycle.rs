//! Order status transitions and their effect on reporting.
//!
//! All status writes go through [`change_status`], which checks the move
//! against a [`TransitionPolicy`] before touching storage.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::order::Order;
use crate::store::{OrderStore, StoreError};
use crate::types::{OrderId, OrderStatus};

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Which status moves are legal.
///
/// The strict table only moves forward along
/// `pending → confirmed → shipped → delivered`, with `cancelled` reachable
/// from any non-terminal state. With corrections enabled, an operator may
/// also move an order backwards between the four progress states.
/// `cancelled` is terminal either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionPolicy {
    allow_corrections: bool,
}

impl TransitionPolicy {
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            allow_corrections: false,
        }
    }

    #[must_use]
    pub const fn with_corrections() -> Self {
        Self {
            allow_corrections: true,
        }
    }

    /// Whether `from → to` is a legal change. Same-status moves are not
    /// changes and are handled by [`TransitionPolicy::check`].
    #[must_use]
    pub const fn permits(self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::{Cancelled, Confirmed, Delivered, Pending, Shipped};

        match (from, to) {
            (Cancelled, _) => false,
            (Delivered, Cancelled) => false,
            (_, Cancelled)
            | (Pending, Confirmed)
            | (Confirmed, Shipped)
            | (Shipped, Delivered) => true,
            _ => {
                self.allow_corrections
                    && from.progress_rank().is_some()
                    && to.progress_rank().is_some()
            }
        }
    }

    /// Statuses an order in `from` may move to.
    #[must_use]
    pub fn next_statuses(self, from: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|&to| to != from && self.permits(from, to))
            .collect()
    }

    /// Check a requested move.
    ///
    /// Returns `Ok(false)` when the order is already in `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not permitted.
    pub const fn check(self, from: OrderStatus, to: OrderStatus) -> Result<bool, TransitionError> {
        if from as u8 == to as u8 {
            return Ok(false);
        }
        if self.permits(from, to) {
            Ok(true)
        } else {
            Err(TransitionError { from, to })
        }
    }
}

/// Failure to change an order's status.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Another change landed between reading the order and writing it.
    #[error("order status changed to {actual} while moving it from {expected}")]
    StatusChanged {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Move an order to a new status under `policy`.
///
/// Setting the current status again succeeds without writing.
///
/// # Errors
///
/// Returns `NotFound` for an unknown order, `Transition` for an illegal move,
/// `StatusChanged` when a concurrent change got there first, or the store
/// error if reading or writing fails.
#[tracing::instrument(skip(store), fields(order_id = %id))]
pub async fn change_status<S: OrderStore + ?Sized>(
    store: &S,
    policy: TransitionPolicy,
    id: &OrderId,
    to: OrderStatus,
) -> Result<Order, LifecycleError> {
    let mut order = store.get_order(id).await?.ok_or(LifecycleError::NotFound)?;

    if !policy.check(order.status, to)? {
        return Ok(order);
    }

    let now = Utc::now();
    if !store.update_order_status(id, order.status, to, now).await? {
        return Err(match store.get_order(id).await? {
            None => LifecycleError::NotFound,
            Some(current) => LifecycleError::StatusChanged {
                expected: order.status,
                actual: current.status,
            },
        });
    }

    tracing::info!(from = %order.status, to = %to, order_number = %order.order_number, "Order status changed");
    order.status = to;
    order.updated_at = now;
    Ok(order)
}

/// Permanently remove an order. Deleting a missing order is not an error.
///
/// Returns whether a record was removed. Callers must obtain an explicit
/// confirmation before calling this.
///
/// # Errors
///
/// Returns the store error if the delete fails.
#[tracing::instrument(skip(store), fields(order_id = %id))]
pub async fn delete_order<S: OrderStore + ?Sized>(store: &S, id: &OrderId) -> Result<bool, StoreError> {
    let removed = store.delete_order(id).await?;
    if removed {
        tracing::info!("Order deleted");
    }
    Ok(removed)
}

/// Sum of totals over orders that count toward revenue.
#[must_use]
pub fn revenue(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .filter(|o| o.status.counts_toward_revenue())
        .map(|o| o.total)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

/// Order counts and revenue for the dashboard.
///
/// Cancelled orders are counted but contribute no revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub by_status: Vec<StatusCount>,
    pub revenue: Decimal,
}

impl OrderStats {
    #[must_use]
    pub fn collect(orders: &[Order]) -> Self {
        let by_status = OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: orders.iter().filter(|o| o.status == status).count(),
            })
            .collect();
        Self {
            total_orders: orders.len(),
            by_status,
            revenue: revenue(orders),
        }
    }

    #[must_use]
    pub fn count_for(&self, status: OrderStatus) -> usize {
        self.by_status
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}
