use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use election_client::BallotSubmissionRecord;

/// Ballot submission row in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub transaction_hash: String,
    pub account: String,
    pub timestamp: String, // fixed-width RFC 3339, sorts chronologically
    pub verified: bool,
}

impl From<&BallotSubmissionRecord> for SubmissionRow {
    fn from(record: &BallotSubmissionRecord) -> Self {
        SubmissionRow {
            transaction_hash: record.transaction_hash.to_string(),
            account: record.account.to_string(),
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            verified: record.verified,
        }
    }
}

impl TryFrom<SubmissionRow> for BallotSubmissionRecord {
    type Error = anyhow::Error;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(BallotSubmissionRecord {
            transaction_hash: row
                .transaction_hash
                .parse()
                .map_err(|e| anyhow!("corrupt transaction hash {}: {}", row.transaction_hash, e))?,
            account: row
                .account
                .parse()
                .map_err(|e| anyhow!("corrupt account {}: {}", row.account, e))?,
            timestamp: DateTime::parse_from_rfc3339(&row.timestamp)?.with_timezone(&Utc),
            verified: row.verified,
        })
    }
}
