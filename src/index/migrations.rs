//! Versioned schema migrations for the item cache.
//!
//! The schema version is tracked in the `meta` table under `schema_version`.
//! Each migration has a version number and runs exactly once.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{IndexerError, Result};

/// Current schema version. Increment when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

type MigrationFn = fn(&Connection) -> Result<()>;

/// All migrations in order. Index + 1 = version number.
const MIGRATIONS: &[MigrationFn] = &[migration_v1_base_schema];

/// Runs all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    let current_version = schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(IndexerError::Index(format!(
            "Cache schema version {} is newer than supported version {}",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as u32;
        if version > current_version {
            migration(conn)?;
            set_schema_version(conn, version)?;
        }
    }

    Ok(())
}

/// Reads the stored schema version; 0 for a database without one.
///
/// Does not write, so it is safe on read-only connections.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    if !table_exists(conn, "meta")? {
        return Ok(0);
    }

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.and_then(|v| v.parse().ok()).unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        [version.to_string()],
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// v1: one row per record keyed by `(kind, path)`, plus one summary per crate.
///
/// `parent` is the `::`-joined path minus its last segment, so a children
/// listing is an index lookup; descendant listings are range scans on `path`.
fn migration_v1_base_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            kind TEXT NOT NULL,
            path TEXT NOT NULL,
            crate TEXT NOT NULL,
            parent TEXT NOT NULL,
            depth INTEGER NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (kind, path)
        );

        CREATE INDEX IF NOT EXISTS idx_items_parent ON items(kind, parent);
        CREATE INDEX IF NOT EXISTS idx_items_crate ON items(crate);

        CREATE TABLE IF NOT EXISTS summaries (
            crate TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
