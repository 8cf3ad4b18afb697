use thiserror::Error;

use crate::{submission::BallotSubmissionStatus, types::TransactionHash};

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Failure to accept an off-chain resource anchored by an on-chain checksum.
#[derive(Debug, Error)]
pub enum ResourceVerificationError {
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },
    #[error("resource at {url} is not valid JSON for the expected type: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("resource at {url} was rejected by the type guard")]
    Rejected { url: String },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Verification(#[from] ResourceVerificationError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dry run of {entrypoint} failed: {reason}")]
    DryRunFailed { entrypoint: String, reason: String },

    #[error("malformed return value from {entrypoint}: {details}")]
    MalformedReturnValue { entrypoint: String, details: String },

    #[error("node error: {0}")]
    Node(String),

    #[error("wallet rejected the transaction: {0}")]
    WalletRejected(String),

    #[error("invalid ballot: {0}")]
    InvalidBallot(String),

    #[error("election is not accepting ballots ({0})")]
    ElectionClosed(String),

    #[error("no wallet connected")]
    NotConnected,

    #[error("illegal status transition for {hash}: {from:?} -> {to:?}")]
    IllegalTransition {
        hash: TransactionHash,
        from: BallotSubmissionStatus,
        to: BallotSubmissionStatus,
    },

    #[error("decode worker is gone")]
    WorkerGone,
}
