//! Settings singleton persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_core::settings::StoreSettings;
use opal_core::store::{SettingsStore, StoreResult};
use rust_decimal::Decimal;

use crate::{PgStore, parse_column, store_error};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    shipping_cost: Decimal,
    free_shipping_threshold: Decimal,
    currency: String,
    currency_symbol: String,
    updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl SettingsStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn get_settings(&self) -> StoreResult<Option<StoreSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            SELECT shipping_cost, free_shipping_threshold, currency, currency_symbol, updated_at
            FROM opal.store_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool())
        .await
        .map_err(store_error)?;

        row.map(|r| {
            Ok(StoreSettings {
                shipping_cost: r.shipping_cost,
                free_shipping_threshold: r.free_shipping_threshold,
                currency: parse_column("currency", &r.currency)?,
                currency_symbol: r.currency_symbol,
                updated_at: r.updated_at,
            })
        })
        .transpose()
    }

    #[tracing::instrument(skip(self, settings))]
    async fn put_settings(&self, settings: &StoreSettings) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO opal.store_settings
                (id, shipping_cost, free_shipping_threshold, currency, currency_symbol, updated_at)
            VALUES (1, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET shipping_cost = EXCLUDED.shipping_cost,
                free_shipping_threshold = EXCLUDED.free_shipping_threshold,
                currency = EXCLUDED.currency,
                currency_symbol = EXCLUDED.currency_symbol,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(settings.shipping_cost)
        .bind(settings.free_shipping_threshold)
        .bind(settings.currency.code())
        .bind(&settings.currency_symbol)
        .bind(settings.updated_at)
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
