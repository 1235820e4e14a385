//! Order persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_core::order::{Contact, Order, OrderLine, ShippingAddress, normalize_order_number};
use opal_core::store::{OrderStore, StoreError, StoreResult};
use opal_core::{OrderId, OrderStatus};
use rust_decimal::Decimal;
use sqlx::types::Json;

use crate::{PgStore, parse_column, store_error};

const ORDER_COLUMNS: &str = "id, order_number, items, contact, shipping_address, payment_method, \
     subtotal, shipping_cost, total, currency, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    items: Json<Vec<OrderLine>>,
    contact: Json<Contact>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    subtotal: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            items: row.items.0,
            contact: row.contact.0,
            shipping_address: row.shipping_address.0,
            payment_method: parse_column("payment_method", &row.payment_method)?,
            subtotal: row.subtotal,
            shipping_cost: row.shipping_cost,
            total: row.total,
            currency: parse_column("currency", &row.currency)?,
            status: parse_column("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgStore {
    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO opal.customer_order (
                id, order_number, items, contact, shipping_address, payment_method,
                subtotal, shipping_cost, total, currency, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(order.id.as_str())
        .bind(&order.order_number)
        .bind(Json(&order.items))
        .bind(Json(&order.contact))
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(order.currency.code())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn order_number_exists(&self, order_number: &str) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM opal.customer_order WHERE order_number = $1)",
        )
        .bind(normalize_order_number(order_number))
        .fetch_one(self.pool())
        .await
        .map_err(store_error)
    }

    #[tracing::instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM opal.customer_order WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error)?;

        row.map(Order::try_from).transpose()
    }

    #[tracing::instrument(skip(self, email))]
    async fn find_order_by_number_and_email(
        &self,
        order_number: &str,
        email: &str,
    ) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM opal.customer_order \
             WHERE order_number = $1 AND lower(contact ->> 'email') = lower($2)"
        ))
        .bind(normalize_order_number(order_number))
        .bind(email.trim())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error)?;

        row.map(Order::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(order_id = %id))]
    async fn update_order_status(
        &self,
        id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE opal.customer_order SET status = $3, updated_at = $4 \
             WHERE id = $1 AND status = $2",
        )
        .bind(id.as_str())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(updated_at)
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: &OrderId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM opal.customer_order WHERE id = $1")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM opal.customer_order ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(store_error)?;

        rows.into_iter().map(Order::try_from).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn clear_orders(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM opal.customer_order")
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
