//! Shared utility functions for the submission service

use election_client::{AccountAddress, TransactionHash};

use crate::error::ApiError;

pub use election_client::utils::env_parse;

pub fn parse_transaction_hash(s: &str) -> Result<TransactionHash, ApiError> {
    s.parse().map_err(|details| ApiError::BadRequest {
        what: "transaction hash",
        details,
    })
}

pub fn parse_account(s: &str) -> Result<AccountAddress, ApiError> {
    s.parse().map_err(|details| ApiError::BadRequest {
        what: "account address",
        details,
    })
}
