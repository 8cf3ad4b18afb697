//! Read-only views of the election contract

use std::sync::Arc;

use log::debug;

use crate::{
    consts::{
        ENTRYPOINT_VIEW_CONFIG, ENTRYPOINT_VIEW_ELECTION_RESULT, ENTRYPOINT_VIEW_ENCRYPTED_TALLY,
        ENTRYPOINT_VIEW_GUARDIANS_STATE,
    },
    election::{ElectionConfig, ElectionResult, EncryptedTally, GuardiansState},
    error::{ClientError, Result},
    node::{InvokeRequest, InvokeResult, NodeClient},
    types::ContractAddress,
    worker::{decode_job, DecodeJob, DecodeOutput, DecodeWorker},
};

/// Dry-runs the contract's view entry points and decodes their return values.
///
/// A view the node reports as failed yields `Ok(None)` ("not available yet").
/// A successful view whose return value is missing or undecodable is a
/// contract/client version mismatch and always surfaces as
/// [`ClientError::MalformedReturnValue`].
#[derive(Clone)]
pub struct ContractReader {
    node: Arc<dyn NodeClient>,
    contract: ContractAddress,
    contract_name: String,
    worker: Option<DecodeWorker>,
}

impl ContractReader {
    pub fn new(
        node: Arc<dyn NodeClient>,
        contract: ContractAddress,
        contract_name: impl Into<String>,
    ) -> Self {
        Self {
            node,
            contract,
            contract_name: contract_name.into(),
            worker: None,
        }
    }

    /// Decode return values on `worker` instead of the calling task.
    pub fn with_worker(mut self, worker: DecodeWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn contract(&self) -> ContractAddress {
        self.contract
    }

    pub fn receive_name(&self, entrypoint: &str) -> String {
        format!("{}.{}", self.contract_name, entrypoint)
    }

    pub async fn config(&self) -> Result<Option<ElectionConfig>> {
        match self.view(ENTRYPOINT_VIEW_CONFIG, DecodeJob::Config).await? {
            Some(DecodeOutput::Config(config)) => Ok(Some(config)),
            Some(other) => Err(unexpected(ENTRYPOINT_VIEW_CONFIG, other)),
            None => Ok(None),
        }
    }

    pub async fn guardians_state(&self) -> Result<Option<GuardiansState>> {
        match self
            .view(ENTRYPOINT_VIEW_GUARDIANS_STATE, DecodeJob::GuardiansState)
            .await?
        {
            Some(DecodeOutput::GuardiansState(state)) => Ok(Some(state)),
            Some(other) => Err(unexpected(ENTRYPOINT_VIEW_GUARDIANS_STATE, other)),
            None => Ok(None),
        }
    }

    pub async fn encrypted_tally(&self) -> Result<Option<EncryptedTally>> {
        match self
            .view(ENTRYPOINT_VIEW_ENCRYPTED_TALLY, DecodeJob::EncryptedTally)
            .await?
        {
            Some(DecodeOutput::EncryptedTally(tally)) => Ok(Some(tally)),
            Some(other) => Err(unexpected(ENTRYPOINT_VIEW_ENCRYPTED_TALLY, other)),
            None => Ok(None),
        }
    }

    pub async fn election_result(&self) -> Result<Option<ElectionResult>> {
        match self
            .view(ENTRYPOINT_VIEW_ELECTION_RESULT, DecodeJob::ElectionResult)
            .await?
        {
            Some(DecodeOutput::ElectionResult(result)) => Ok(Some(result)),
            Some(other) => Err(unexpected(ENTRYPOINT_VIEW_ELECTION_RESULT, other)),
            None => Ok(None),
        }
    }

    async fn view(
        &self,
        entrypoint: &str,
        job: fn(Vec<u8>) -> DecodeJob,
    ) -> Result<Option<DecodeOutput>> {
        let request = InvokeRequest {
            contract: self.contract,
            receive_name: self.receive_name(entrypoint),
            parameter: Vec::new(),
            invoker: None,
            amount: 0,
        };
        let bytes = match self.node.invoke_instance(request).await? {
            InvokeResult::Failure { reason, .. } => {
                debug!("View {} unavailable: {}", entrypoint, reason);
                return Ok(None);
            }
            InvokeResult::Success {
                return_value: None,
                ..
            } => {
                return Err(ClientError::MalformedReturnValue {
                    entrypoint: entrypoint.to_string(),
                    details: "missing return value".to_string(),
                })
            }
            InvokeResult::Success {
                return_value: Some(bytes),
                ..
            } => bytes,
        };

        let decoded = match &self.worker {
            Some(worker) => worker.decode(job(bytes)).await?,
            None => decode_job(job(bytes)),
        };
        decoded
            .map(Some)
            .map_err(|details| ClientError::MalformedReturnValue {
                entrypoint: entrypoint.to_string(),
                details,
            })
    }
}

fn unexpected(entrypoint: &str, output: DecodeOutput) -> ClientError {
    ClientError::MalformedReturnValue {
        entrypoint: entrypoint.to_string(),
        details: format!("decoder produced {:?}", output),
    }
}
