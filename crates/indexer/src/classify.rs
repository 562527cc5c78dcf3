//! Calldata classification.
//!
//! First stage of per-transaction processing: decide whether the input bytes
//! are a creation payload, a direct ethscription transfer, an ESIP-5 batch,
//! or nothing we care about. Log-driven events are dispatched separately and
//! in addition to the calldata class.

use alloy_primitives::B256;

/// Recognized `data:` URI prefixes for phunk creations.
const SVG_PREFIX: &str = "data:image/svg+xml,";
const PNG_PREFIX: &str = "data:image/png;base64,";

/// What a transaction's calldata is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallClass {
    /// A creation candidate; carries the null-stripped payload string whose
    /// SHA keys the collection dictionary.
    Creation(String),
    /// A `data:` URI of some other MIME type. The whole transaction is
    /// ignored, logs included.
    ForeignDataUri,
    /// Exactly one 32-byte word: a direct transfer of that hash.
    Transfer(B256),
    /// A multiple of 32 bytes: ESIP-5 batch transfer, words in calldata
    /// order.
    Batch(Vec<B256>),
    /// Anything else.
    None,
}

/// Classifies raw calldata. `word_len` is the byte width of one batch
/// segment (32 on every known chain).
pub fn classify_calldata(input: &[u8], word_len: usize) -> CallClass {
    if input.is_empty() {
        return CallClass::None;
    }

    let cleaned = clean_utf8(input);
    if cleaned.starts_with(SVG_PREFIX) || cleaned.starts_with(PNG_PREFIX) {
        return CallClass::Creation(cleaned);
    }
    if cleaned.starts_with("data:") {
        return CallClass::ForeignDataUri;
    }

    if input.len() == word_len {
        return CallClass::Transfer(B256::from_slice(input));
    }
    if input.len() % word_len == 0 {
        let words = input.chunks_exact(word_len).map(B256::from_slice).collect();
        return CallClass::Batch(words);
    }

    CallClass::None
}

/// Lossy UTF-8 decode with nulls stripped, the normalization applied before
/// both the prefix check and the SHA-256 over the payload.
fn clean_utf8(input: &[u8]) -> String {
    String::from_utf8_lossy(input).replace('\0', "")
}
