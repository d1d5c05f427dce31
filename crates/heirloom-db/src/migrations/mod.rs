//! Catalog schema migrations.
//!
//! Each step is an embedded SQL file applied once, in version order, inside
//! its own transaction. Applied steps are recorded in `schema_migrations`.
//! A catalog written by a newer release is refused rather than modified.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::queries::format_timestamp;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration {version} ({name}) failed: {source}")]
    Failed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },

    #[error("Catalog schema version {found} is newer than this release supports ({supported})")]
    NewerSchema { found: u32, supported: u32 },
}

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "submissions",
        sql: include_str!("001_initial.sql"),
    },
    Step {
        version: 2,
        name: "superseded_files",
        sql: include_str!("002_superseded_files.sql"),
    },
];

/// Where a catalog stands relative to the schema this build knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current: u32,
    pub latest: u32,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.current == self.latest
    }

    pub fn pending(&self) -> u32 {
        self.latest.saturating_sub(self.current)
    }
}

fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

fn ensure_ledger(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
}

fn recorded_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Report the catalog's schema version without changing anything but the
/// ledger table itself.
pub fn schema_status(conn: &Connection) -> Result<SchemaStatus, MigrationError> {
    ensure_ledger(conn)?;
    Ok(SchemaStatus {
        current: recorded_version(conn)?,
        latest: latest_version(),
    })
}

/// Bring the catalog up to the latest schema. Returns how many steps ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let status = schema_status(conn)?;
    if status.current > status.latest {
        return Err(MigrationError::NewerSchema {
            found: status.current,
            supported: status.latest,
        });
    }

    let mut applied = 0;
    for step in STEPS.iter().filter(|step| step.version > status.current) {
        let failed = |source| MigrationError::Failed {
            version: step.version,
            name: step.name,
            source,
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![step.version, step.name, format_timestamp(Utc::now())],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        tracing::info!("Catalog schema at version {} ({})", step.version, step.name);
        applied += 1;
    }

    Ok(applied)
}
