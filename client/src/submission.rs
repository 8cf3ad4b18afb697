//! Application-level record of a single vote transaction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClientError, Result},
    types::TransactionHash,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallotSubmissionStatus {
    /// Sent to the node, not yet finalized.
    Committed,
    /// Transaction failed on chain.
    Rejected,
    /// Finalized, waiting for the backend to verify the ballot.
    Approved,
    /// Finalized but excluded by ballot verification.
    Discarded,
    /// Finalized and verified.
    Verified,
}

impl BallotSubmissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Discarded | Self::Verified)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use BallotSubmissionStatus::*;
        matches!(
            (self, next),
            (Committed, Approved) | (Committed, Rejected) | (Approved, Verified) | (Approved, Discarded)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSubmission {
    #[serde(rename = "transactionHex")]
    pub transaction_hash: TransactionHash,
    pub status: BallotSubmissionStatus,
    #[serde(rename = "submittedAtISO")]
    pub submitted_at: DateTime<Utc>,
}

impl BallotSubmission {
    pub fn new(transaction_hash: TransactionHash, submitted_at: DateTime<Utc>) -> Self {
        Self {
            transaction_hash,
            status: BallotSubmissionStatus::Committed,
            submitted_at,
        }
    }

    /// Moves to `next` if the edge is legal; otherwise leaves the record untouched.
    pub fn transition(&mut self, next: BallotSubmissionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ClientError::IllegalTransition {
                hash: self.transaction_hash,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
