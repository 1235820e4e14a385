//! Backup export and restore.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use opal_core::backup::{Backup, RestoreError, RestoreJournal, export_backup, restore_backup};
use tracing::instrument;

use super::orders::ConfirmQuery;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Download the whole dataset as JSON.
#[instrument(skip(state))]
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let backup = export_backup(state.store()).await?;
    let disposition = format!(
        "attachment; filename=\"opal-backup-{}.json\"",
        backup.exported_at.format("%Y%m%d-%H%M%S")
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(backup)))
}

/// Replace every collection with the uploaded backup.
///
/// Destructive and not atomic; requires `?confirm=true`. The response is
/// the restore journal, which lists any records that failed to insert.
#[instrument(skip(state, admin, backup))]
pub async fn restore(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<ConfirmQuery>,
    Json(backup): Json<Backup>,
) -> Result<Json<RestoreJournal>> {
    if !query.confirm {
        return Err(AppError::BadRequest(
            "Restoring replaces all data; repeat with confirm=true".to_string(),
        ));
    }

    tracing::warn!(
        admin = %admin.email,
        products = backup.products.len(),
        categories = backup.categories.len(),
        orders = backup.orders.len(),
        "Restoring backup"
    );

    match restore_backup(state.store(), &backup).await {
        Ok(journal) => Ok(Json(journal)),
        Err(e) => {
            if let RestoreError::Aborted { journal, .. } = &e {
                tracing::error!(completed = ?journal.completed, "Restore aborted; re-run to finish");
            }
            Err(e.into())
        }
    }
}
