//! The pre-seeded SHA -> token id collection dictionary.

use alloy_primitives::B256;
use std::{collections::HashMap, path::Path};

/// Dictionary load failures. Both are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dictionary: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads the collection dictionary from a JSON object of
/// `"<sha-hex>": tokenId` entries.
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<HashMap<B256, u64>, DictionaryError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
