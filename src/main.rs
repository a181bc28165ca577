//! Private Health Journal
//!
//! Thin driver over the journal library: opens the database, applies
//! migrations, and writes an export snapshot as JSON to stdout.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use health_journal::db::{self, Database};
use health_journal::repository::LogRepository;

/// Get the database path from environment or use default
fn get_database_path() -> PathBuf {
    std::env::var("HEALTH_JOURNAL_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("health_journal.db");
            path
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to stderr so stdout stays clean for the export JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("health_journal=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_path = get_database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("opening journal database at {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        tracing::info!("database schema version: {version}");
        Ok(())
    })?;

    let repository = LogRepository::new(database);
    let snapshot = repository.export()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
