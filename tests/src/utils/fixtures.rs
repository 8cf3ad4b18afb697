use election_client::{
    election::{ChecksumUrl, EligibilityParameters, EligibleVoters, ElectionConfig, Timestamp},
    AccountAddress,
};
use sha2::{Digest, Sha256};

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

pub fn checksum_url(base_url: &str, name: &str, bytes: &[u8]) -> ChecksumUrl {
    ChecksumUrl {
        url: format!("{}/files/{}", base_url, name),
        hash: sha256(bytes),
    }
}

/// Election whose voting window is open for the whole test run.
pub fn open_election(candidates: Vec<ChecksumUrl>) -> ElectionConfig {
    let unused = ChecksumUrl {
        url: "http://127.0.0.1:9/unused.json".to_string(),
        hash: [0; 32],
    };
    ElectionConfig {
        admin_account: AccountAddress([1; 32]),
        election_manifest: unused.clone(),
        election_parameters: unused.clone(),
        guardian_accounts: vec![AccountAddress([2; 32]), AccountAddress([3; 32])],
        eligible_voters: EligibleVoters {
            parameters: EligibilityParameters {
                start_time: Timestamp(0),
                end_time: Timestamp(1_000),
            },
            data: unused,
        },
        election_description: "Flow test election".to_string(),
        candidates,
        election_start: Timestamp(0),
        election_end: Timestamp(u64::MAX / 2),
        decryption_deadline: Timestamp(u64::MAX / 2),
        delegation_string: "delegatevote2024".to_string(),
    }
}
