//! Client for the ballot verification backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    types::{AccountAddress, TransactionHash},
};

/// Ballot submission as indexed and verified by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotSubmissionRecord {
    pub transaction_hash: TransactionHash,
    pub account: AccountAddress,
    pub timestamp: DateTime<Utc>,
    /// Whether the ballot passed verification and counts towards the tally.
    pub verified: bool,
}

#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// `None` until the backend has processed the transaction.
    async fn submission_status(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<BallotSubmissionRecord>>;

    async fn submissions(&self, account: &AccountAddress) -> Result<Vec<BallotSubmissionRecord>>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VerificationBackend for HttpBackend {
    async fn submission_status(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<BallotSubmissionRecord>> {
        debug!("Polling backend for submission {}", hash);
        Ok(self
            .client
            .get(format!("{}/submission-status/{}", self.base_url, hash))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn submissions(&self, account: &AccountAddress) -> Result<Vec<BallotSubmissionRecord>> {
        Ok(self
            .client
            .get(format!("{}/submissions/{}", self.base_url, account))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}
