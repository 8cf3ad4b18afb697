//! Signing and broadcasting through a connected wallet

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::Network,
    error::{ClientError, Result},
    types::{AccountAddress, ContractAddress, Energy, TransactionHash},
};

/// Contract update transaction handed to the wallet for signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePayload {
    pub contract: ContractAddress,
    pub receive_name: String,
    pub parameter: Vec<u8>,
    pub amount: u64,
    pub max_energy: Energy,
}

#[async_trait]
pub trait WalletConnection: Send + Sync {
    fn account(&self) -> AccountAddress;

    fn network(&self) -> Network;

    /// Signs and broadcasts the update. May wait on user approval for an unbounded time.
    async fn sign_and_send_update(&self, payload: UpdatePayload) -> Result<TransactionHash>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    sender: AccountAddress,
    network: String,
    contract: ContractAddress,
    receive_name: &'a str,
    parameter: String,
    amount: u64,
    max_energy: Energy,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    transaction_hash: Option<TransactionHash>,
    #[serde(default)]
    error: Option<String>,
}

/// Wallet adapter for a signer daemon reachable over HTTP.
#[derive(Clone)]
pub struct HttpWallet {
    client: Client,
    base_url: String,
    account: AccountAddress,
    network: Network,
}

impl HttpWallet {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        account: AccountAddress,
        network: Network,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account,
            network,
        }
    }
}

#[async_trait]
impl WalletConnection for HttpWallet {
    fn account(&self) -> AccountAddress {
        self.account
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn sign_and_send_update(&self, payload: UpdatePayload) -> Result<TransactionHash> {
        let request = SignRequest {
            sender: self.account,
            network: self.network.to_string(),
            contract: payload.contract,
            receive_name: &payload.receive_name,
            parameter: hex::encode(&payload.parameter),
            amount: payload.amount,
            max_energy: payload.max_energy,
        };
        let response: SignResponse = self
            .client
            .post(format!("{}/sign-and-send", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.transaction_hash, response.error) {
            (Some(hash), _) => {
                info!("Wallet broadcast {} as {}", payload.receive_name, hash);
                Ok(hash)
            }
            (None, error) => Err(ClientError::WalletRejected(
                error.unwrap_or_else(|| "no transaction hash returned".to_string()),
            )),
        }
    }
}
