//! Ballot submission: dry run, energy ceiling, wallet broadcast

use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::Utc;
use log::info;

use crate::{
    consts::{ENERGY_MARGIN, ENTRYPOINT_REGISTER_VOTES},
    election::{ElectionConfig, ElectionPhase},
    error::{ClientError, Result},
    node::{InvokeRequest, InvokeResult, NodeClient},
    types::{ContractAddress, TransactionHash},
    wallet::{UpdatePayload, WalletConnection},
};

/// Candidate selection, one entry per on-chain candidate in contract order.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Ballot {
    pub selections: Vec<bool>,
}

impl Ballot {
    pub fn new(selections: Vec<bool>) -> Result<Self> {
        if selections.is_empty() {
            return Err(ClientError::InvalidBallot("no candidates".to_string()));
        }
        Ok(Self { selections })
    }

    /// Ballot selecting only the candidate at `index`.
    pub fn for_candidate(index: usize, candidate_count: usize) -> Result<Self> {
        if index >= candidate_count {
            return Err(ClientError::InvalidBallot(format!(
                "candidate {} out of range for {} candidates",
                index, candidate_count
            )));
        }
        Self::new((0..candidate_count).map(|i| i == index).collect())
    }
}

#[derive(Clone)]
pub struct BallotSubmitter {
    node: Arc<dyn NodeClient>,
    contract: ContractAddress,
    contract_name: String,
}

impl BallotSubmitter {
    pub fn new(
        node: Arc<dyn NodeClient>,
        contract: ContractAddress,
        contract_name: impl Into<String>,
    ) -> Self {
        Self {
            node,
            contract,
            contract_name: contract_name.into(),
        }
    }

    /// Like [`Self::submit`], but first checks the ballot against the election
    /// window and candidate list in `config`.
    pub async fn submit_for_election(
        &self,
        config: &ElectionConfig,
        ballot: &Ballot,
        wallet: &dyn WalletConnection,
    ) -> Result<TransactionHash> {
        let phase = config.phase(Utc::now());
        if phase != ElectionPhase::Voting {
            return Err(ClientError::ElectionClosed(format!("{:?}", phase)));
        }
        if ballot.selections.len() != config.candidates.len() {
            return Err(ClientError::InvalidBallot(format!(
                "{} selections for {} candidates",
                ballot.selections.len(),
                config.candidates.len()
            )));
        }
        self.submit(ballot, wallet).await
    }

    /// Dry-runs the vote registration, then has the wallet sign and send it with
    /// the estimate plus [`ENERGY_MARGIN`] as the energy ceiling. Nothing is
    /// broadcast if the dry run fails.
    pub async fn submit(
        &self,
        ballot: &Ballot,
        wallet: &dyn WalletConnection,
    ) -> Result<TransactionHash> {
        let receive_name = format!("{}.{}", self.contract_name, ENTRYPOINT_REGISTER_VOTES);
        let parameter = borsh::to_vec(ballot)?;
        let sender = wallet.account();

        let dry_run = self
            .node
            .invoke_instance(InvokeRequest {
                contract: self.contract,
                receive_name: receive_name.clone(),
                parameter: parameter.clone(),
                invoker: Some(sender),
                amount: 0,
            })
            .await?;
        let estimate = match dry_run {
            InvokeResult::Success { used_energy, .. } => used_energy,
            InvokeResult::Failure { reason, .. } => {
                return Err(ClientError::DryRunFailed {
                    entrypoint: receive_name,
                    reason,
                })
            }
        };

        let max_energy = estimate.saturating_add(ENERGY_MARGIN);
        info!(
            "Dry run of {} for {} used {}, sending with ceiling {}",
            receive_name, sender, estimate, max_energy
        );
        let payload = UpdatePayload {
            contract: self.contract,
            receive_name,
            parameter,
            amount: 0,
            max_energy,
        };
        wallet.sign_and_send_update(payload).await
    }
}
