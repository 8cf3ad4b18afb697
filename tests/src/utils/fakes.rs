use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use async_trait::async_trait;
use election_client::{
    config::Network,
    consts::{ENTRYPOINT_REGISTER_VOTES, ENTRYPOINT_VIEW_CONFIG},
    election::ElectionConfig,
    node::{InvokeRequest, InvokeResult, NodeClient, TransactionOutcome},
    wallet::{UpdatePayload, WalletConnection},
    AccountAddress, Energy, Result, TransactionHash,
};
use sha2::{Digest, Sha256};

/// Chain that serves one election config, charges a fixed energy for vote
/// registration and finalizes every transaction successfully.
pub struct FakeChain {
    pub config: ElectionConfig,
    pub vote_energy: Energy,
}

#[async_trait]
impl NodeClient for FakeChain {
    async fn invoke_instance(&self, request: InvokeRequest) -> Result<InvokeResult> {
        let entrypoint = request
            .receive_name
            .rsplit('.')
            .next()
            .unwrap_or_default();
        Ok(match entrypoint {
            ENTRYPOINT_VIEW_CONFIG => InvokeResult::Success {
                used_energy: Energy(10),
                return_value: Some(borsh::to_vec(&self.config)?),
            },
            ENTRYPOINT_REGISTER_VOTES if request.invoker.is_some() => InvokeResult::Success {
                used_energy: self.vote_energy,
                return_value: None,
            },
            _ => InvokeResult::Failure {
                used_energy: Energy(1),
                reason: format!("unsupported entrypoint {}", request.receive_name),
            },
        })
    }

    async fn wait_for_finalization(&self, _hash: &TransactionHash) -> Result<TransactionOutcome> {
        Ok(TransactionOutcome::Success)
    }
}

/// Wallet that signs everything and derives hashes from account and nonce.
pub struct FakeWallet {
    pub account: AccountAddress,
    nonce: AtomicU64,
    sent: Mutex<Vec<UpdatePayload>>,
}

impl FakeWallet {
    pub fn new(account: AccountAddress) -> Self {
        Self {
            account,
            nonce: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<UpdatePayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletConnection for FakeWallet {
    fn account(&self) -> AccountAddress {
        self.account
    }

    fn network(&self) -> Network {
        Network::Testnet
    }

    async fn sign_and_send_update(&self, payload: UpdatePayload) -> Result<TransactionHash> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(self.account.0);
        hasher.update(nonce.to_le_bytes());
        self.sent.lock().unwrap().push(payload);
        Ok(TransactionHash(hasher.finalize().into()))
    }
}
