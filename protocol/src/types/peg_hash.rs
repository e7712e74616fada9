//! Peg hash identifiers.
//!
//! A [`PegHash`] is the permanent identity of one peg record. The ledger
//! treats it as opaque bytes: genesis pre-allocation mints short
//! counter-derived hashes, external tooling may mint digest-length ones,
//! and the ledger never inspects the content. Byte-wise ordering is the
//! canonical order everywhere a hash is compared or searched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::MAX_PEG_HASH_LENGTH;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when constructing or parsing a [`PegHash`].
#[derive(Debug, Error)]
pub enum PegHashError {
    /// Peg hashes identify records; an empty one identifies nothing.
    #[error("peg hash must not be empty")]
    Empty,

    /// The hash exceeds the protocol's length cap.
    #[error("peg hash too long: {got} bytes, limit is {max}")]
    TooLong {
        /// Actual length in bytes.
        got: usize,
        /// The configured limit.
        max: usize,
    },

    /// The hex string could not be decoded.
    #[error("invalid hex in peg hash: {0}")]
    InvalidHex(String),
}

// ---------------------------------------------------------------------------
// PegHash
// ---------------------------------------------------------------------------

/// The immutable identifier of one peg record.
///
/// Renders as lowercase hex. Comparison and ordering are over the raw
/// bytes, which matches the order the store iterates keys in.
///
/// # Examples
///
/// ```
/// use keel_protocol::types::PegHash;
///
/// let hash = PegHash::from_index(7);
/// assert_eq!(hash.to_hex(), "37");
/// assert_eq!(hash, "37".parse().unwrap());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PegHash(Vec<u8>);

impl PegHash {
    /// Wraps raw bytes, enforcing the non-empty and length rules.
    pub fn new(bytes: Vec<u8>) -> Result<Self, PegHashError> {
        if bytes.is_empty() {
            return Err(PegHashError::Empty);
        }
        if bytes.len() > MAX_PEG_HASH_LENGTH {
            return Err(PegHashError::TooLong {
                got: bytes.len(),
                max: MAX_PEG_HASH_LENGTH,
            });
        }
        Ok(Self(bytes))
    }

    /// Derives the hash of the `index`-th pre-allocated genesis peg.
    ///
    /// The bytes are the ASCII decimal digits of the index, so index 0
    /// is the single byte `0x30` and displays as `"30"`. Compact, unique
    /// per index, and trivially reproducible by any client.
    pub fn from_index(index: u64) -> Self {
        Self(index.to_string().into_bytes())
    }

    /// Parses a lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, PegHashError> {
        let bytes = hex::decode(s).map_err(|e| PegHashError::InvalidHex(e.to_string()))?;
        Self::new(bytes)
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering, the canonical external form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Length of the raw identifier in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed hash; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PegHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PegHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PegHash({})", self.to_hex())
    }
}

impl FromStr for PegHash {
    type Err = PegHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PegHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PegHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PegHash::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            PegHash::new(bytes).map_err(serde::de::Error::custom)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
