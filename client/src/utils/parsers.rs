use crate::types::AccountAddress;
use std::str::FromStr;

pub fn parse_account(s: &str) -> Result<AccountAddress, String> {
    AccountAddress::from_str(s).map_err(|e| format!("invalid account: {e}"))
}

pub fn parse_base_58_32(s: &str) -> Result<[u8; 32], String> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| format!("Invalid base58: {}", e))?;
    if bytes.len() != 32 {
        return Err(format!("Expected 32 bytes, got {}", bytes.len()));
    }
    let mut array = [0u8; 32];
    array.copy_from_slice(&bytes);
    Ok(array)
}

pub fn parse_hex_32(s: &str) -> Result<[u8; 32], String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| format!("Invalid hex: {}", e))?;
    if bytes.len() != 32 {
        return Err(format!("Expected 32 bytes, got {}", bytes.len()));
    }
    let mut array = [0u8; 32];
    array.copy_from_slice(&bytes);
    Ok(array)
}

pub fn parse_selection_entry(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "x" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(format!("invalid selection entry: {}", other)),
    }
}

/// Parses a comma separated selection such as `true,false,false` or `1,0,0`.
pub fn parse_selection(s: &str) -> Result<Vec<bool>, String> {
    s.split(',').map(parse_selection_entry).collect()
}

pub fn parse_view_type(s: &str) -> Result<ViewType, String> {
    match s.to_lowercase().as_str() {
        "config" => Ok(ViewType::Config),
        "guardians" => Ok(ViewType::Guardians),
        "tally" => Ok(ViewType::EncryptedTally),
        "result" => Ok(ViewType::ElectionResult),
        _ => Err(format!("invalid view type: {}", s)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewType {
    Config,
    Guardians,
    EncryptedTally,
    ElectionResult,
}
