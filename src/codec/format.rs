//! Entry File Format
//!
//! Every persisted entry is a self-contained envelope:
//!
//! ```text
//! +---------+----------------------+-------------+---------------+
//! | "OCHE"  | header length (u32)  | JSON header | JSON payload  |
//! +---------+----------------------+-------------+---------------+
//! ```
//!
//! The header records the format version, the payload length and an XXH3
//! checksum of the payload. The payload is the JSON form of `Option<V>`, so a
//! cached absence is stored as `null`. Decoding is a pure function that
//! validates every field before deserializing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Magic bytes identifying an entry file.
pub const ENTRY_MAGIC: [u8; 4] = *b"OCHE";

/// Current entry format version.
pub const ENTRY_FORMAT_VERSION: u32 = 1;

const PREFIX_LEN: usize = ENTRY_MAGIC.len() + 4;

// == Entry Header ==
/// Header written in front of every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Entry format version
    pub format_version: u32,
    /// Length of the payload in bytes
    pub payload_len: u64,
    /// XXH3-64 of the payload, lowercase hex
    pub checksum: String,
}

impl EntryHeader {
    fn for_payload(payload: &[u8]) -> Self {
        Self {
            format_version: ENTRY_FORMAT_VERSION,
            payload_len: payload.len() as u64,
            checksum: checksum(payload),
        }
    }
}

fn checksum(payload: &[u8]) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(payload))
}

// == Encode ==
/// Serializes `value` into a complete entry envelope.
pub fn encode<V: Serialize>(value: Option<&V>) -> Result<Vec<u8>> {
    let payload =
        serde_json::to_vec(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    let header = serde_json::to_vec(&EntryHeader::for_payload(&payload))
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    let header_len = u32::try_from(header.len())
        .map_err(|_| CacheError::Serialization("entry header too large".to_string()))?;

    let mut output = Vec::with_capacity(PREFIX_LEN + header.len() + payload.len());
    output.extend_from_slice(&ENTRY_MAGIC);
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header);
    output.extend_from_slice(&payload);
    Ok(output)
}

// == Decode ==
/// Validates an entry envelope and deserializes its payload.
///
/// Returns `Ok(None)` for a stored absence.
pub fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<Option<V>> {
    let (header, payload) = split(bytes)?;

    if header.format_version != ENTRY_FORMAT_VERSION {
        return Err(CacheError::corrupt(format!(
            "format version {} (expected {})",
            header.format_version, ENTRY_FORMAT_VERSION
        )));
    }
    if header.payload_len != payload.len() as u64 {
        return Err(CacheError::corrupt(format!(
            "payload length {} (header says {})",
            payload.len(),
            header.payload_len
        )));
    }
    let actual = checksum(payload);
    if header.checksum != actual {
        return Err(CacheError::corrupt(format!(
            "checksum mismatch: expected {}, got {}",
            header.checksum, actual
        )));
    }

    serde_json::from_slice(payload).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn split(bytes: &[u8]) -> Result<(EntryHeader, &[u8])> {
    if bytes.len() < PREFIX_LEN {
        return Err(CacheError::corrupt("file too short"));
    }
    if bytes[..ENTRY_MAGIC.len()] != ENTRY_MAGIC {
        return Err(CacheError::corrupt("missing magic bytes"));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[ENTRY_MAGIC.len()..PREFIX_LEN]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;

    let rest = &bytes[PREFIX_LEN..];
    if rest.len() < header_len {
        return Err(CacheError::corrupt("truncated header"));
    }
    let (header_bytes, payload) = rest.split_at(header_len);
    let header: EntryHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| CacheError::corrupt(format!("unreadable header: {e}")))?;
    Ok((header, payload))
}
