use std::time::Duration;

/// Added to the dry-run energy estimate before sending a vote. Executions that
/// use exactly the estimated energy have been observed to run out.
pub const ENERGY_MARGIN: u64 = 1;

/// Default delay between backend verification polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Namespace of the per-account submission list in the local store.
pub const SUBMISSIONS_STORAGE_NAMESPACE: &str = "ballot-submissions";

pub const DEFAULT_CONTRACT_NAME: &str = "election";

pub const ENTRYPOINT_VIEW_CONFIG: &str = "viewConfig";
pub const ENTRYPOINT_VIEW_GUARDIANS_STATE: &str = "viewGuardiansState";
pub const ENTRYPOINT_VIEW_ENCRYPTED_TALLY: &str = "viewEncryptedTally";
pub const ENTRYPOINT_VIEW_ELECTION_RESULT: &str = "viewElectionResult";
pub const ENTRYPOINT_REGISTER_VOTES: &str = "registerVotes";
