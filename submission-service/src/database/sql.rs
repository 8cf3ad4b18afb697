//! SQL statement constants for database operations

pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

pub const CREATE_BALLOT_SUBMISSIONS_TABLE_SQL: &str = r#"
CREATE TABLE ballot_submissions (
    transaction_hash TEXT PRIMARY KEY, -- hex
    account TEXT NOT NULL, -- base58
    timestamp TEXT NOT NULL, -- RFC 3339, UTC, millisecond precision
    verified INTEGER NOT NULL
)
"#;

pub const CREATE_DB_INDEXES: &[&str] = &[
    "CREATE INDEX idx_submissions_account ON ballot_submissions(account, timestamp)",
];

pub const UPSERT_SUBMISSION_SQL: &str = r#"
INSERT INTO ballot_submissions (transaction_hash, account, timestamp, verified)
VALUES (?, ?, ?, ?)
ON CONFLICT(transaction_hash) DO UPDATE SET
    account = excluded.account,
    timestamp = excluded.timestamp,
    verified = excluded.verified
"#;
