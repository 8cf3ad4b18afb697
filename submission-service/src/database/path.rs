//! Where the submission index lives on disk

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, PartialEq, Eq)]
pub enum StoreLocation {
    InMemory,
    File(PathBuf),
}

impl StoreLocation {
    pub fn open(&self) -> rusqlite::Result<rusqlite::Connection> {
        match self {
            StoreLocation::InMemory => rusqlite::Connection::open_in_memory(),
            StoreLocation::File(path) => rusqlite::Connection::open(path),
        }
    }
}

/// Resolves `DB_PATH` into a store location, creating missing parent
/// directories. The index file itself must be absent or a plain file.
pub fn resolve_store_location(db_path: &str) -> Result<StoreLocation> {
    let db_path = db_path.trim();
    if db_path == IN_MEMORY {
        return Ok(StoreLocation::InMemory);
    }
    if db_path.is_empty() {
        bail!("DB_PATH is empty; use {IN_MEMORY} for a throwaway index");
    }
    if db_path.chars().any(char::is_control) {
        bail!("DB_PATH contains control characters");
    }

    let path = Path::new(db_path);
    if path.components().any(|c| c == Component::ParentDir) {
        bail!("DB_PATH must not climb out of its directory with '..'");
    }
    if path.file_name().is_none() {
        bail!("DB_PATH {db_path:?} does not name a submission index file");
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            bail!("Submission index {db_path:?} is a symlink")
        }
        Ok(meta) if !meta.is_file() => bail!("Submission index {db_path:?} is not a regular file"),
        Ok(_) => {}
        Err(_) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for submission index {db_path:?}")
                })?;
            }
        }
    }

    Ok(StoreLocation::File(path.to_path_buf()))
}
