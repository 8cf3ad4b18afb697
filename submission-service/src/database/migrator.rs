//! Database migrations

use anyhow::Result;
use rusqlite::{params, Connection};
use tracing::info;

use super::constants::{CURRENT_SCHEMA_VERSION, MIGRATION_DESCRIPTIONS};
use super::sql::{
    CREATE_BALLOT_SUBMISSIONS_TABLE_SQL, CREATE_DB_INDEXES, CREATE_MIGRATIONS_TABLE_SQL,
};

/// Run all pending database migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    info!("Running database migrations");

    conn.execute(CREATE_MIGRATIONS_TABLE_SQL, [])?;

    let current_version = get_current_version(conn)?;
    info!("Current database version: {}", current_version);

    if current_version < 1 {
        apply_migration_v1(conn)?;
    }

    info!(
        "All migrations completed (schema version {})",
        CURRENT_SCHEMA_VERSION
    );
    Ok(())
}

/// Get the current schema version
pub fn get_current_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Apply migration version 1: submissions table and indexes.
fn apply_migration_v1(conn: &mut Connection) -> Result<()> {
    info!("Applying migration v1: {}", MIGRATION_DESCRIPTIONS[0]);

    let tx = conn.transaction()?;
    tx.execute(CREATE_BALLOT_SUBMISSIONS_TABLE_SQL, [])?;
    for index_sql in CREATE_DB_INDEXES {
        tx.execute(index_sql, [])?;
    }
    tx.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        params![1, chrono::Utc::now().to_rfc3339(), MIGRATION_DESCRIPTIONS[0]],
    )?;
    tx.commit()?;

    info!("Migration v1 completed successfully");
    Ok(())
}
