use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::models::SubmissionRow;
use super::sql::UPSERT_SUBMISSION_SQL;

/// Database operations for ballot submissions
impl SubmissionRow {
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        debug!(
            "Upserting submission {} for {} (verified: {})",
            self.transaction_hash, self.account, self.verified
        );
        conn.execute(
            UPSERT_SUBMISSION_SQL,
            params![
                self.transaction_hash,
                self.account,
                self.timestamp,
                self.verified
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch atomically, returning the number of rows written
    pub fn upsert_batch(conn: &mut Connection, rows: &[SubmissionRow]) -> Result<usize> {
        let tx = conn.transaction()?;
        for row in rows {
            row.upsert(&tx)?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn get_by_hash(conn: &Connection, transaction_hash: &str) -> Result<Option<SubmissionRow>> {
        Ok(conn
            .query_row(
                "SELECT * FROM ballot_submissions WHERE transaction_hash = ?",
                [transaction_hash],
                Self::from_row,
            )
            .optional()?)
    }

    /// All submissions of `account`, oldest first
    pub fn list_by_account(conn: &Connection, account: &str) -> Result<Vec<SubmissionRow>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM ballot_submissions \
             WHERE account = ? \
             ORDER BY timestamp, transaction_hash",
        )?;
        let rows = stmt.query_map([account], Self::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count(conn: &Connection) -> Result<u64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM ballot_submissions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(SubmissionRow {
            transaction_hash: row.get("transaction_hash")?,
            account: row.get("account")?,
            timestamp: row.get("timestamp")?,
            verified: row.get("verified")?,
        })
    }
}
