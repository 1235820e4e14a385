//! Store-wide settings singleton.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::CurrencyCode;

/// Errors raised when settings hold invalid values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("shipping cost cannot be negative")]
    NegativeShippingCost,
    #[error("free shipping threshold cannot be negative")]
    NegativeThreshold,
    #[error("currency symbol cannot be empty")]
    MissingCurrencySymbol,
}

/// Shipping and currency configuration read on every pricing computation.
///
/// A `free_shipping_threshold` of zero means shipping is always free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub shipping_cost: Decimal,
    pub free_shipping_threshold: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub currency_symbol: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            shipping_cost: Decimal::ZERO,
            free_shipping_threshold: Decimal::ZERO,
            currency: CurrencyCode::default(),
            currency_symbol: CurrencyCode::default().symbol().to_owned(),
            updated_at: None,
        }
    }
}

impl StoreSettings {
    /// # Errors
    ///
    /// Returns an error for negative amounts or a blank symbol.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.shipping_cost.is_sign_negative() {
            return Err(SettingsError::NegativeShippingCost);
        }
        if self.free_shipping_threshold.is_sign_negative() {
            return Err(SettingsError::NegativeThreshold);
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(SettingsError::MissingCurrencySymbol);
        }
        Ok(())
    }

    /// Format an amount with the store's currency symbol.
    #[must_use]
    pub fn format_amount(&self, amount: Decimal) -> String {
        crate::types::Price::new(amount, self.currency).display_with(&self.currency_symbol)
    }
}
