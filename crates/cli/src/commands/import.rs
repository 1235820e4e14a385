//! Catalog import from a JSON or CSV file.
//!
//! ```bash
//! # Dry run: parse and report
//! opal import products.csv
//!
//! # Write the parsed products
//! opal import products.json --commit
//! ```
//!
//! Spreadsheets should be exported to CSV first.

use std::io::Write;
use std::path::Path;

use opal_core::import::{self, ImportError, ImportFormat, ImportOptions, ImportReport};
use opal_core::store::SettingsStore;

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum ImportCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("{0}")]
    Format(String),
}

impl From<std::io::Error> for ImportCommandError {
    fn from(e: std::io::Error) -> Self {
        Self::Command(e.into())
    }
}

/// Pick the format: explicit flag, then file extension, then content.
///
/// # Errors
///
/// Returns an error for an unsupported `--format` value.
pub fn resolve_format(
    explicit: Option<&str>,
    path: &Path,
    content: &str,
) -> Result<ImportFormat, ImportCommandError> {
    if let Some(raw) = explicit {
        return raw.parse().map_err(ImportCommandError::Format);
    }
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<ImportFormat>().ok());
    Ok(by_extension.unwrap_or_else(|| ImportFormat::detect(content)))
}

/// Parse `path` and print the report; with `commit`, write the products.
///
/// # Errors
///
/// Returns an error if the file is unreadable as a whole or the database
/// cannot be reached for a commit. Bad rows are only reported.
pub async fn run(path: &Path, format: Option<&str>, commit: bool) -> Result<(), ImportCommandError> {
    let content = std::fs::read_to_string(path)?;
    let format = resolve_format(format, path, &content)?;

    let (report, written) = if commit {
        let store = connect().await?;
        let settings = store
            .get_settings()
            .await
            .map_err(CommandError::from)?
            .unwrap_or_default();
        let options = ImportOptions {
            default_currency: settings.currency,
        };
        let mut report = import::parse_with(&content, format, options)?;
        let written = import::commit(&store, &mut report).await;
        (report, Some(written))
    } else {
        (import::parse(&content, format)?, None)
    };

    print_report(&report, written)?;
    Ok(())
}

fn print_report(report: &ImportReport, written: Option<usize>) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "Parsed {} product(s)", report.products.len())?;
    for warning in &report.warnings {
        writeln!(out, "  warning: {warning}")?;
    }
    for error in &report.errors {
        writeln!(out, "  error: {error}")?;
    }
    match written {
        Some(count) => writeln!(out, "Wrote {count} product(s)")?,
        None => writeln!(out, "Dry run; pass --commit to write")?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_format_wins() {
        let format = resolve_format(Some("json"), Path::new("a.csv"), "a,b").unwrap();
        assert_eq!(format, ImportFormat::Json);
    }

    #[test]
    fn test_extension_then_content() {
        assert_eq!(
            resolve_format(None, Path::new("catalog.CSV"), "[]").unwrap(),
            ImportFormat::Csv
        );
        assert_eq!(
            resolve_format(None, Path::new("catalog.txt"), "  [{}]").unwrap(),
            ImportFormat::Json
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(matches!(
            resolve_format(Some("xlsx"), Path::new("a.xlsx"), ""),
            Err(ImportCommandError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_needs_no_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, "title,price\nTee,20\n").unwrap();

        run(&path, None, false).await.unwrap();
    }
}
