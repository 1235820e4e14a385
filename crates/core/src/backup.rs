//! Full-dataset export and destructive restore.
//!
//! Restore is not atomic. It runs as a fixed sequence of phases (clear every
//! collection, then re-insert categories, products and orders with their
//! original ids, then overwrite settings) and records each completed phase
//! in a [`RestoreJournal`]. Every run starts by clearing, so an interrupted
//! restore can be re-run from the top.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Product};
use crate::order::Order;
use crate::settings::StoreSettings;
use crate::store::{DataStore, StoreError};

/// Current backup document version.
pub const BACKUP_VERSION: u32 = 1;

/// A snapshot of every collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub orders: Vec<Order>,
    #[serde(default)]
    pub store_settings: StoreSettings,
}

/// Take a snapshot of the whole store.
///
/// Unlike display reads this does not degrade: a backend failure is an error,
/// never an empty backup.
///
/// # Errors
///
/// Returns the first store error encountered.
#[tracing::instrument(skip(store))]
pub async fn export_backup<S: DataStore + ?Sized>(store: &S) -> Result<Backup, StoreError> {
    let backup = Backup {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        products: store.list_products().await?,
        categories: store.list_categories().await?,
        orders: store.list_orders().await?,
        store_settings: store.get_settings().await?.unwrap_or_default(),
    };
    tracing::info!(
        products = backup.products.len(),
        categories = backup.categories.len(),
        orders = backup.orders.len(),
        "Backup exported"
    );
    Ok(backup)
}

/// One step of a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePhase {
    ClearProducts,
    ClearCategories,
    ClearOrders,
    InsertCategories,
    InsertProducts,
    InsertOrders,
    WriteSettings,
}

impl RestorePhase {
    /// Every phase, in execution order.
    pub const ALL: [Self; 7] = [
        Self::ClearProducts,
        Self::ClearCategories,
        Self::ClearOrders,
        Self::InsertCategories,
        Self::InsertProducts,
        Self::InsertOrders,
        Self::WriteSettings,
    ];
}

impl std::fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ClearProducts => "clear products",
            Self::ClearCategories => "clear categories",
            Self::ClearOrders => "clear orders",
            Self::InsertCategories => "insert categories",
            Self::InsertProducts => "insert products",
            Self::InsertOrders => "insert orders",
            Self::WriteSettings => "write settings",
        };
        f.write_str(name)
    }
}

/// A record that could not be re-inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreFailure {
    pub phase: RestorePhase,
    pub record_id: String,
    pub message: String,
}

/// Progress of a restore run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreJournal {
    pub completed: Vec<RestorePhase>,
    pub failures: Vec<RestoreFailure>,
    pub categories_restored: usize,
    pub products_restored: usize,
    pub orders_restored: usize,
    pub settings_restored: bool,
}

impl RestoreJournal {
    /// Whether every phase ran and every record was restored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() == RestorePhase::ALL.len() && self.failures.is_empty()
    }

    fn fail(&mut self, phase: RestorePhase, record_id: impl Into<String>, error: &StoreError) {
        let record_id = record_id.into();
        tracing::warn!(%phase, %record_id, error = %error, "Failed to restore record");
        self.failures.push(RestoreFailure {
            phase,
            record_id,
            message: error.to_string(),
        });
    }
}

/// Why a restore stopped.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("unsupported backup version {found} (expected {BACKUP_VERSION})")]
    UnsupportedVersion { found: u32 },

    /// A whole phase failed. `journal` holds what had completed.
    #[error("restore aborted during {phase}: {source}")]
    Aborted {
        phase: RestorePhase,
        journal: Box<RestoreJournal>,
        #[source]
        source: StoreError,
    },
}

/// Replace the whole dataset with `backup`.
///
/// Per-record insert failures are collected in the journal and the restore
/// carries on. A failure that takes out a whole phase (clearing, or writing
/// settings) aborts.
///
/// # Errors
///
/// Returns `UnsupportedVersion` before touching the store, or `Aborted` with
/// the partial journal.
#[tracing::instrument(skip_all, fields(version = backup.version))]
pub async fn restore_backup<S: DataStore + ?Sized>(
    store: &S,
    backup: &Backup,
) -> Result<RestoreJournal, RestoreError> {
    if backup.version != BACKUP_VERSION {
        return Err(RestoreError::UnsupportedVersion {
            found: backup.version,
        });
    }

    let mut journal = RestoreJournal::default();

    macro_rules! phase {
        ($phase:expr, $op:expr) => {
            match $op.await {
                Ok(_) => journal.completed.push($phase),
                Err(source) => {
                    return Err(RestoreError::Aborted {
                        phase: $phase,
                        journal: Box::new(journal),
                        source,
                    });
                }
            }
        };
    }

    phase!(RestorePhase::ClearProducts, store.clear_products());
    phase!(RestorePhase::ClearCategories, store.clear_categories());
    phase!(RestorePhase::ClearOrders, store.clear_orders());

    for category in &backup.categories {
        match store.create_category(category).await {
            Ok(()) => journal.categories_restored += 1,
            Err(e) => journal.fail(RestorePhase::InsertCategories, category.id.as_str(), &e),
        }
    }
    journal.completed.push(RestorePhase::InsertCategories);

    for product in &backup.products {
        match store.create_product(product).await {
            Ok(()) => journal.products_restored += 1,
            Err(e) => journal.fail(RestorePhase::InsertProducts, product.id.as_str(), &e),
        }
    }
    journal.completed.push(RestorePhase::InsertProducts);

    for order in &backup.orders {
        match store.insert_order(order).await {
            Ok(()) => journal.orders_restored += 1,
            Err(e) => journal.fail(RestorePhase::InsertOrders, order.id.as_str(), &e),
        }
    }
    journal.completed.push(RestorePhase::InsertOrders);

    phase!(
        RestorePhase::WriteSettings,
        store.put_settings(&backup.store_settings)
    );
    journal.settings_restored = true;

    tracing::info!(
        categories = journal.categories_restored,
        products = journal.products_restored,
        orders = journal.orders_restored,
        failures = journal.failures.len(),
        "Backup restored"
    );
    Ok(journal)
}
