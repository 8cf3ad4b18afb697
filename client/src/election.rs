//! Read models of the election contract state

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AccountAddress;

/// Milliseconds since the unix epoch, as stored by the contract.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshSerialize, BorshDeserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Timestamp(time.timestamp_millis().max(0) as u64)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.0).ok()?)
    }
}

/// Location of an off-chain resource together with the SHA-256 of its bytes.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChecksumUrl {
    pub url: String,
    pub hash: [u8; 32],
}

impl ChecksumUrl {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct EligibilityParameters {
    /// Start of the window in which voting weight is measured.
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct EligibleVoters {
    pub parameters: EligibilityParameters,
    /// List of eligible voters with their weights.
    pub data: ChecksumUrl,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ElectionConfig {
    pub admin_account: AccountAddress,
    pub election_manifest: ChecksumUrl,
    pub election_parameters: ChecksumUrl,
    pub guardian_accounts: Vec<AccountAddress>,
    pub eligible_voters: EligibleVoters,
    pub election_description: String,
    pub candidates: Vec<ChecksumUrl>,
    pub election_start: Timestamp,
    pub election_end: Timestamp,
    pub decryption_deadline: Timestamp,
    /// Memo prefix recognised as a vote delegation.
    pub delegation_string: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ElectionPhase {
    Setup,
    Voting,
    Tally,
    Finished,
}

impl ElectionConfig {
    pub fn phase(&self, now: DateTime<Utc>) -> ElectionPhase {
        let now = Timestamp::from_datetime(now);
        if now < self.election_start {
            ElectionPhase::Setup
        } else if now < self.election_end {
            ElectionPhase::Voting
        } else if now < self.decryption_deadline {
            ElectionPhase::Tally
        } else {
            ElectionPhase::Finished
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum GuardianStatus {
    /// Guardian found invalid verification keys of the listed guardians.
    KeyVerificationFailed(Vec<AccountAddress>),
    SharesVerificationFailed(Vec<AccountAddress>),
    VerificationSuccessful,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct GuardianState {
    pub index: u32,
    pub verification_key: Option<Vec<u8>>,
    pub encryption_public_key: Option<Vec<u8>>,
    pub decryption_share: Option<Vec<u8>>,
    pub decryption_share_proof: Option<Vec<u8>>,
    pub status: Option<GuardianStatus>,
}

pub type GuardiansState = Vec<(AccountAddress, GuardianState)>;

/// Opaque encrypted tally, present once the tally has been posted.
pub type EncryptedTally = Option<Vec<u8>>;

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CandidateResult {
    pub candidate: ChecksumUrl,
    pub cumulative_votes: u64,
}

pub type ElectionResult = Option<Vec<CandidateResult>>;

/// Off-chain candidate metadata referenced from [`ElectionConfig::candidates`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetails {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description_url: Option<String>,
}

impl CandidateDetails {
    /// Type guard applied when fetching candidate metadata.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A candidate whose metadata passed checksum verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedCandidate {
    /// Position of the candidate in the on-chain list, which is also its ballot index.
    pub index: usize,
    pub details: CandidateDetails,
}
