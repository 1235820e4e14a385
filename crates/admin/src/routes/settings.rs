//! Store settings.

use axum::{Json, extract::State};
use chrono::Utc;
use opal_core::settings::StoreSettings;
use opal_core::store::SettingsStore;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Current settings, or the defaults if none were ever saved.
///
/// Unlike storefront reads this does not degrade: saving a form pre-filled
/// with defaults would overwrite real settings.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    let settings = state.store().get_settings().await?.unwrap_or_default();
    Ok(Json(settings))
}

/// Replace the settings.
#[instrument(skip(state, settings))]
pub async fn update(
    State(state): State<AppState>,
    Json(mut settings): Json<StoreSettings>,
) -> Result<Json<StoreSettings>> {
    settings.currency_symbol = settings.currency_symbol.trim().to_string();
    settings.validate()?;
    settings.updated_at = Some(Utc::now());

    state.store().put_settings(&settings).await?;

    tracing::info!(
        shipping_cost = %settings.shipping_cost,
        free_shipping_threshold = %settings.free_shipping_threshold,
        "Store settings updated"
    );
    Ok(Json(settings))
}
