//! Backup export and restore.
//!
//! ```bash
//! opal backup export -o backup.json
//! opal backup restore -i backup.json --yes
//! ```

use std::io::Write;
use std::path::Path;

use opal_core::backup::{Backup, RestoreError, RestoreJournal, export_backup, restore_backup};

use super::{CommandError, connect};

/// Failure of a backup command.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Restore(#[from] RestoreError),

    /// The restore ran but some records were not written.
    #[error("restore finished with {0} failed record(s); fix the backup and re-run")]
    Incomplete(usize),
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        Self::Command(e.into())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        Self::Command(e.into())
    }
}

/// Write a backup to `output`, or stdout when absent.
///
/// # Errors
///
/// Returns an error if the store cannot be read in full or the file cannot
/// be written.
pub async fn export(output: Option<&Path>) -> Result<(), BackupError> {
    let store = connect().await?;
    let backup = export_backup(&store).await.map_err(CommandError::from)?;
    let json = serde_json::to_string_pretty(&backup)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), "Backup written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

/// Read and parse a backup file without touching the database.
///
/// # Errors
///
/// Returns an error if the file is unreadable or not a backup document.
pub fn read_backup(path: &Path) -> Result<Backup, BackupError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Replace the whole dataset with the backup at `input`.
///
/// Refuses to run unless `confirmed`. Prints the restore journal as JSON.
///
/// # Errors
///
/// Returns an error if the restore is refused, aborts, or leaves records
/// behind.
pub async fn restore(input: &Path, confirmed: bool) -> Result<(), BackupError> {
    if !confirmed {
        return Err(CommandError::Refused(
            "restore deletes all products, categories and orders first; pass --yes to proceed"
                .to_string(),
        )
        .into());
    }

    let backup = read_backup(input)?;
    let store = connect().await?;

    tracing::warn!(
        products = backup.products.len(),
        categories = backup.categories.len(),
        orders = backup.orders.len(),
        "Restoring backup"
    );

    let journal = match restore_backup(&store, &backup).await {
        Ok(journal) => journal,
        Err(e) => {
            if let RestoreError::Aborted { journal, .. } = &e {
                print_journal(journal)?;
            }
            return Err(e.into());
        }
    };

    print_journal(&journal)?;
    if journal.is_complete() {
        Ok(())
    } else {
        Err(BackupError::Incomplete(journal.failures.len()))
    }
}

fn print_journal(journal: &RestoreJournal) -> Result<(), BackupError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(journal)?)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opal_core::backup::BACKUP_VERSION;

    use super::*;

    #[test]
    fn test_read_backup_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(
            &path,
            r#"{"version":1,"exportedAt":"2026-01-02T03:04:05Z","products":[],"categories":[],"orders":[]}"#,
        )
        .unwrap();

        let backup = read_backup(&path).unwrap();
        assert_eq!(backup.version, BACKUP_VERSION);
        assert_eq!(backup.store_settings, opal_core::settings::StoreSettings::default());
    }

    #[test]
    fn test_read_backup_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            read_backup(&path),
            Err(BackupError::Command(CommandError::Json(_)))
        ));
    }

    #[tokio::test]
    async fn test_restore_requires_confirmation() {
        let err = restore(Path::new("unused.json"), false).await.unwrap_err();
        assert!(matches!(err, BackupError::Command(CommandError::Refused(_))));
    }
}
