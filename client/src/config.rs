//! Client configuration, loaded from `ELECTION_*` environment variables

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use log::info;

use crate::{
    consts::{DEFAULT_CONTRACT_NAME, DEFAULT_POLL_INTERVAL},
    types::ContractAddress,
    utils::env_parse,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Err(format!(
                "Invalid network '{}'. Must be one of: mainnet, testnet",
                s
            )),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub node_url: String,
    pub backend_url: String,
    pub wallet_url: String,
    pub contract: ContractAddress,
    pub contract_name: String,
    pub network: Network,
    pub poll_interval: Duration,
    /// `None` polls the backend until the ballot is verified or discarded.
    pub max_verification_polls: Option<u32>,
    pub request_timeout: Duration,
    pub store_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:20000".to_string(),
            backend_url: "http://localhost:3000".to_string(),
            wallet_url: "http://localhost:7000".to_string(),
            contract: ContractAddress::new(0, 0),
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            network: Network::Testnet,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_verification_polls: None,
            request_timeout: Duration::from_secs(30),
            store_path: PathBuf::from("election-client.db"),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_polls: u32 = env_parse("ELECTION_MAX_VERIFICATION_POLLS", 0);
        let config = Self {
            node_url: env_parse("ELECTION_NODE_URL", defaults.node_url),
            backend_url: env_parse("ELECTION_BACKEND_URL", defaults.backend_url),
            wallet_url: env_parse("ELECTION_WALLET_URL", defaults.wallet_url),
            contract: env_parse("ELECTION_CONTRACT", defaults.contract),
            contract_name: env_parse("ELECTION_CONTRACT_NAME", defaults.contract_name),
            network: env_parse("ELECTION_NETWORK", defaults.network),
            poll_interval: Duration::from_millis(env_parse(
                "ELECTION_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            max_verification_polls: (max_polls > 0).then_some(max_polls),
            request_timeout: Duration::from_secs(env_parse(
                "ELECTION_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            store_path: env_parse("ELECTION_STORE_PATH", defaults.store_path),
        };
        info!(
            "Loaded client config for {} contract {} on {}",
            config.contract_name, config.contract, config.network
        );
        config
    }

    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
    }
}
