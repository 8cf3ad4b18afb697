//! Access to the chain: dry-run invocations and finalization waits

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClientError, Result},
    types::{AccountAddress, ContractAddress, Energy, TransactionHash},
};

/// Read-only simulated call of a contract entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeRequest {
    pub contract: ContractAddress,
    /// Fully qualified `<contract>.<entrypoint>` name.
    pub receive_name: String,
    pub parameter: Vec<u8>,
    pub invoker: Option<AccountAddress>,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvokeResult {
    Success {
        used_energy: Energy,
        return_value: Option<Vec<u8>>,
    },
    Failure {
        used_energy: Energy,
        reason: String,
    },
}

/// Outcome of a finalized transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TransactionOutcome {
    Success,
    Failure { reason: String },
}

#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn invoke_instance(&self, request: InvokeRequest) -> Result<InvokeResult>;

    /// Resolves once the transaction is finalized. There is no upper bound on the wait.
    async fn wait_for_finalization(&self, hash: &TransactionHash) -> Result<TransactionOutcome>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeBody {
    contract: ContractAddress,
    receive_name: String,
    parameter: String,
    invoker: Option<AccountAddress>,
    amount: u64,
}

#[derive(Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
enum InvokeResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        used_energy: u64,
        return_value: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Failure { used_energy: u64, reason: String },
}

impl TryFrom<InvokeResponse> for InvokeResult {
    type Error = ClientError;

    fn try_from(response: InvokeResponse) -> Result<Self> {
        Ok(match response {
            InvokeResponse::Success {
                used_energy,
                return_value,
            } => InvokeResult::Success {
                used_energy: Energy(used_energy),
                return_value: return_value
                    .map(hex::decode)
                    .transpose()
                    .map_err(|e| ClientError::Node(format!("return value is not hex: {e}")))?,
            },
            InvokeResponse::Failure {
                used_energy,
                reason,
            } => InvokeResult::Failure {
                used_energy: Energy(used_energy),
                reason,
            },
        })
    }
}

/// Node gateway speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpNodeClient {
    client: Client,
    base_url: String,
    poll_interval: Duration,
}

impl HttpNodeClient {
    pub fn new(client: Client, base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
        }
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn invoke_instance(&self, request: InvokeRequest) -> Result<InvokeResult> {
        debug!("Invoking {} on {}", request.receive_name, request.contract);
        let body = InvokeBody {
            contract: request.contract,
            receive_name: request.receive_name,
            parameter: hex::encode(&request.parameter),
            invoker: request.invoker,
            amount: request.amount,
        };
        let response: InvokeResponse = self
            .client
            .post(format!("{}/v1/invoke", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.try_into()
    }

    async fn wait_for_finalization(&self, hash: &TransactionHash) -> Result<TransactionOutcome> {
        let url = format!("{}/v1/transactions/{}/finalized", self.base_url, hash);
        loop {
            let response = self.client.get(&url).send().await?;
            match response.status() {
                StatusCode::ACCEPTED => {
                    debug!("Transaction {} not finalized yet", hash);
                    tokio::time::sleep(self.poll_interval).await;
                }
                StatusCode::NOT_FOUND => {
                    return Err(ClientError::Node(format!("unknown transaction {hash}")));
                }
                _ => return Ok(response.error_for_status()?.json().await?),
            }
        }
    }
}
