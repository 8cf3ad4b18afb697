use reqwest::Response;

use crate::error::{ClientError, Result};

// ENV config for maximum allowed size (in bytes) of an off-chain resource body.
// Keeps a hostile resource host from exhausting memory.
pub const DEFAULT_MAX_RESOURCE_BYTES: usize = 8 * 1024 * 1024; // 8 MiB

pub fn max_resource_bytes() -> usize {
    if let Ok(kb_str) = std::env::var("ELECTION_MAX_RESOURCE_KB") {
        if let Ok(kb) = kb_str.parse::<usize>() {
            return kb.saturating_mul(1024);
        }
    }
    DEFAULT_MAX_RESOURCE_BYTES
}

/// Drain a response body, failing once more than `max_size` bytes arrive.
pub async fn read_body_with_limit(mut response: Response, max_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(std::cmp::min(max_size, 64 * 1024));
    while let Some(chunk) = response.chunk().await? {
        if out.len() + chunk.len() > max_size {
            return Err(ClientError::BodyTooLarge {
                url: response.url().to_string(),
                limit: max_size,
            });
        }
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

/// Parse an environment variable into a type implementing FromStr, with a default fallback
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
