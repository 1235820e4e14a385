//! Opal CLI - migrations, backups and catalog import.
//!
//! # Usage
//!
//! ```bash
//! # Create or update the schema (store tables and sessions)
//! opal migrate
//!
//! # Back up everything to a file, or restore it
//! opal backup export -o backup.json
//! opal backup restore -i backup.json --yes
//!
//! # Import a catalog (dry run unless --commit)
//! opal import products.csv --commit
//!
//! # Hash the operator password for ADMIN_PASSWORD_HASH
//! opal admin hash-password
//! ```
//!
//! Database commands read `DATABASE_URL`. Logs go to stderr so exported
//! JSON on stdout stays clean.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "opal")]
#[command(author, version, about = "Opal store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Export or restore a full backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Import products from a JSON or CSV file
    Import {
        /// File to import
        file: PathBuf,

        /// `json` or `csv` (default: from the extension or content)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the parsed products (default is a dry run)
        #[arg(long)]
        commit: bool,
    },
    /// Operator account helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write every collection as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a backup (destructive)
    Restore {
        /// Backup file
        #[arg(short, long)]
        input: PathBuf,

        /// Confirm that existing data will be deleted
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Read a password from stdin and print its Argon2 hash
    HashPassword,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "opal=info,opal_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Backup { action } => match action {
            BackupAction::Export { output } => {
                commands::backup::export(output.as_deref()).await?;
            }
            BackupAction::Restore { input, yes } => {
                commands::backup::restore(&input, yes).await?;
            }
        },
        Commands::Import {
            file,
            format,
            commit,
        } => commands::import::run(&file, format.as_deref(), commit).await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => commands::admin::hash_password_from_stdin()?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_restore_flags() {
        let cli = Cli::try_parse_from(["opal", "backup", "restore", "-i", "b.json", "--yes"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Backup {
                action: BackupAction::Restore { yes: true, .. }
            })
        ));
    }
}
