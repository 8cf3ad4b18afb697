//! Types for HTTP requests and responses

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub git_hash: &'static str,
    pub build_time: &'static str,
    pub submissions: u64,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub inserted: usize,
}
