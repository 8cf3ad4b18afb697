//! Client library for an on-chain election: reads the contract state, verifies
//! checksummed off-chain resources, submits ballots and tracks them until the
//! verification backend has counted them.

pub mod backend;
pub mod checksum;
pub mod config;
pub mod consts;
pub mod contract;
pub mod election;
pub mod error;
pub mod node;
pub mod session;
pub mod storage;
pub mod submission;
pub mod submit;
pub mod tracker;
pub mod types;
pub mod utils;
pub mod wallet;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use backend::{BallotSubmissionRecord, HttpBackend, VerificationBackend};
pub use checksum::ChecksumResourceFetcher;
pub use config::{ClientConfig, Network};
pub use contract::ContractReader;
pub use error::{ClientError, ResourceVerificationError, Result};
pub use session::ElectionSession;
pub use submission::{BallotSubmission, BallotSubmissionStatus};
pub use submit::{Ballot, BallotSubmitter};
pub use tracker::{MonitorScopes, ScopeGuard, StatusUpdate, SubmissionStatusTracker};
pub use types::{AccountAddress, ContractAddress, Energy, TransactionHash};
