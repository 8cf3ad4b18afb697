//! Fetching of off-chain JSON resources anchored by an on-chain SHA-256

use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::{
    election::{CandidateDetails, ChecksumUrl, ElectionConfig, VerifiedCandidate},
    error::{ResourceVerificationError, Result},
    utils::{max_resource_bytes, read_body_with_limit},
};

#[derive(Clone)]
pub struct ChecksumResourceFetcher {
    client: Client,
    max_bytes: usize,
}

impl ChecksumResourceFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_bytes: max_resource_bytes(),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub async fn fetch_verified<T: DeserializeOwned>(&self, resource: &ChecksumUrl) -> Result<T> {
        self.fetch_verified_with(resource, |_: &T| true).await
    }

    /// Fetches `resource`, verifies its digest and parses it, then applies `guard`.
    /// Network errors propagate as-is; there are no retries.
    pub async fn fetch_verified_with<T, F>(&self, resource: &ChecksumUrl, guard: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        debug!("Fetching checksum resource {}", resource.url);
        let response = self
            .client
            .get(&resource.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = read_body_with_limit(response, self.max_bytes).await?;
        Ok(verify_resource(resource, &bytes, guard)?)
    }

    /// Fetches every candidate's metadata. Candidates that fail to load or verify
    /// are left out, so one bad entry cannot take down the whole list.
    pub async fn fetch_candidates(&self, config: &ElectionConfig) -> Vec<VerifiedCandidate> {
        let fetches = config.candidates.iter().map(|candidate| {
            self.fetch_verified_with(candidate, CandidateDetails::is_well_formed)
        });
        join_all(fetches)
            .await
            .into_iter()
            .zip(&config.candidates)
            .enumerate()
            .filter_map(|(index, (result, candidate))| match result {
                Ok(details) => Some(VerifiedCandidate { index, details }),
                Err(e) => {
                    warn!("Excluding candidate {} ({}): {}", index, candidate.url, e);
                    None
                }
            })
            .collect()
    }
}

/// Checks `bytes` against the expected digest, then parses and guards them.
pub fn verify_resource<T, F>(
    resource: &ChecksumUrl,
    bytes: &[u8],
    guard: F,
) -> std::result::Result<T, ResourceVerificationError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let actual = hex::encode(Sha256::digest(bytes));
    let expected = resource.hash_hex();
    if !actual.eq_ignore_ascii_case(&expected) {
        return Err(ResourceVerificationError::ChecksumMismatch {
            url: resource.url.clone(),
            expected,
            actual,
        });
    }

    let value: T =
        serde_json::from_slice(bytes).map_err(|source| ResourceVerificationError::InvalidJson {
            url: resource.url.clone(),
            source,
        })?;
    if !guard(&value) {
        return Err(ResourceVerificationError::Rejected {
            url: resource.url.clone(),
        });
    }
    Ok(value)
}
