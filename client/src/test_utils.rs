use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::{
    backend::{BallotSubmissionRecord, VerificationBackend},
    config::Network,
    election::{ChecksumUrl, EligibilityParameters, EligibleVoters, ElectionConfig, Timestamp},
    error::{ClientError, Result},
    node::{InvokeRequest, InvokeResult, NodeClient, TransactionOutcome},
    types::{AccountAddress, Energy, TransactionHash},
    wallet::{UpdatePayload, WalletConnection},
};

pub fn sample_config() -> ElectionConfig {
    let resource = |name: &str| ChecksumUrl {
        url: format!("https://example.com/{}", name),
        hash: [0; 32],
    };
    ElectionConfig {
        admin_account: AccountAddress([1; 32]),
        election_manifest: resource("manifest.json"),
        election_parameters: resource("parameters.json"),
        guardian_accounts: vec![AccountAddress([2; 32])],
        eligible_voters: EligibleVoters {
            parameters: EligibilityParameters {
                start_time: Timestamp(0),
                end_time: Timestamp(1_000),
            },
            data: resource("voters.json"),
        },
        election_description: "Board election".to_string(),
        candidates: vec![resource("a.json"), resource("b.json")],
        election_start: Timestamp(10_000),
        election_end: Timestamp(20_000),
        decryption_deadline: Timestamp(30_000),
        delegation_string: "delegatevote2024".to_string(),
    }
}

pub fn record(hash: TransactionHash, account: AccountAddress, verified: bool) -> BallotSubmissionRecord {
    BallotSubmissionRecord {
        transaction_hash: hash,
        account,
        timestamp: Utc::now(),
        verified,
    }
}

/// Node with scripted view results and finalization outcomes. Finalization
/// waits until an outcome is scripted for the hash.
#[derive(Default)]
pub struct MockNode {
    views: Mutex<HashMap<String, InvokeResult>>,
    invocations: Mutex<Vec<InvokeRequest>>,
    outcomes: Mutex<HashMap<TransactionHash, std::result::Result<TransactionOutcome, String>>>,
    finalized: Notify,
    finalization_calls: AtomicUsize,
}

impl MockNode {
    pub fn set_view(&self, receive_name: &str, result: InvokeResult) {
        self.views
            .lock()
            .unwrap()
            .insert(receive_name.to_string(), result);
    }

    pub fn invocations(&self) -> Vec<InvokeRequest> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn finalize(&self, hash: TransactionHash, outcome: std::result::Result<TransactionOutcome, String>) {
        self.outcomes.lock().unwrap().insert(hash, outcome);
        self.finalized.notify_waiters();
    }

    pub fn finalization_calls(&self) -> usize {
        self.finalization_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn invoke_instance(&self, request: InvokeRequest) -> Result<InvokeResult> {
        let result = self
            .views
            .lock()
            .unwrap()
            .get(&request.receive_name)
            .cloned()
            .unwrap_or(InvokeResult::Failure {
                used_energy: Energy(0),
                reason: "NoSuchView".to_string(),
            });
        self.invocations.lock().unwrap().push(request);
        Ok(result)
    }

    async fn wait_for_finalization(&self, hash: &TransactionHash) -> Result<TransactionOutcome> {
        self.finalization_calls.fetch_add(1, Ordering::SeqCst);
        loop {
            let notified = self.finalized.notified();
            if let Some(outcome) = self.outcomes.lock().unwrap().get(hash).cloned() {
                return outcome.map_err(ClientError::Node);
            }
            notified.await;
        }
    }
}

#[derive(Default)]
pub struct MockBackend {
    records: Mutex<HashMap<TransactionHash, BallotSubmissionRecord>>,
    polls: AtomicUsize,
}

impl MockBackend {
    pub fn set_record(&self, hash: TransactionHash, record: BallotSubmissionRecord) {
        self.records.lock().unwrap().insert(hash, record);
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerificationBackend for MockBackend {
    async fn submission_status(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<BallotSubmissionRecord>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(hash).cloned())
    }

    async fn submissions(&self, account: &AccountAddress) -> Result<Vec<BallotSubmissionRecord>> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.account == *account)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

/// Wallet that accepts every update and hands out predictable hashes.
pub struct MockWallet {
    account: AccountAddress,
    sent: Mutex<Vec<UpdatePayload>>,
}

impl MockWallet {
    pub fn new(account: AccountAddress) -> Self {
        Self {
            account,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Hash returned for the `n`th update sent through this wallet.
    pub fn hash_for(&self, n: usize) -> TransactionHash {
        let mut bytes = [0xa0; 32];
        bytes[..8].copy_from_slice(&(n as u64).to_be_bytes());
        bytes[8..16].copy_from_slice(&self.account.0[..8]);
        TransactionHash(bytes)
    }

    pub fn sent(&self) -> Vec<UpdatePayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletConnection for MockWallet {
    fn account(&self) -> AccountAddress {
        self.account
    }

    fn network(&self) -> Network {
        Network::Testnet
    }

    async fn sign_and_send_update(&self, payload: UpdatePayload) -> Result<TransactionHash> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(payload);
        Ok(self.hash_for(sent.len() - 1))
    }
}
