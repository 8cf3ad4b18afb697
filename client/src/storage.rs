//! Per-account persistence of ballot submissions
//!
//! Every write replaces the account's whole list; the last writer wins.

use std::{collections::HashMap, path::Path, sync::Mutex};

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    consts::SUBMISSIONS_STORAGE_NAMESPACE, error::Result, submission::BallotSubmission,
    types::AccountAddress,
};

pub trait SubmissionStore: Send + Sync {
    fn load(&self, account: &AccountAddress) -> Result<Vec<BallotSubmission>>;

    fn save(&self, account: &AccountAddress, submissions: &[BallotSubmission]) -> Result<()>;
}

pub fn storage_key(account: &AccountAddress) -> String {
    format!("{}.{}", SUBMISSIONS_STORAGE_NAMESPACE, account)
}

const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

const CREATE_KV_TABLE_SQL: &str = r#"
CREATE TABLE kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL, -- json
    updated_at TEXT NOT NULL
)
"#;

const MIGRATION_DESCRIPTIONS: &[&str] = &["Key/value table for submission lists"];

/// SQLite-backed key/value store holding one JSON list per account.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        info!("Opening submission store at {:?}", path.as_ref());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut connection: Connection) -> Result<Self> {
        run_migrations(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(CREATE_MIGRATIONS_TABLE_SQL, [])?;
    let current_version: i32 = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<i32>>(0)
        })?
        .unwrap_or(0);
    debug!("Submission store schema version: {}", current_version);

    if current_version < 1 {
        let tx = conn.transaction()?;
        tx.execute(CREATE_KV_TABLE_SQL, [])?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
            params![1, chrono::Utc::now().to_rfc3339(), MIGRATION_DESCRIPTIONS[0]],
        )?;
        tx.commit()?;
        info!("Applied submission store migration v1");
    }
    Ok(())
}

impl SubmissionStore for SqliteStore {
    fn load(&self, account: &AccountAddress) -> Result<Vec<BallotSubmission>> {
        let conn = self.connection.lock().expect("store mutex poisoned");
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?",
                params![storage_key(account)],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, account: &AccountAddress, submissions: &[BallotSubmission]) -> Result<()> {
        let json = serde_json::to_string(submissions)?;
        let conn = self.connection.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
            params![storage_key(account), json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<BallotSubmission>>>,
}

impl SubmissionStore for MemoryStore {
    fn load(&self, account: &AccountAddress) -> Result<Vec<BallotSubmission>> {
        Ok(self
            .entries
            .lock()
            .expect("store mutex poisoned")
            .get(&storage_key(account))
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, account: &AccountAddress, submissions: &[BallotSubmission]) -> Result<()> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(storage_key(account), submissions.to_vec());
        Ok(())
    }
}
