//! # Peg Store
//!
//! The sorted key-value abstraction every ledger operation runs against,
//! plus its three implementations.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs    — PegStore trait, namespaces, keys, typed peg accessors
//! db.rs     — LedgerDb: persistent sled backend, one tree per namespace
//! memory.rs — MemStore: ordered in-memory maps for tests and tooling
//! batch.rs  — TxContext: write overlay giving one batch its atomicity
//! ```
//!
//! ## Key Layout
//!
//! | Namespace   | Key                       | Value              |
//! |-------------|---------------------------|--------------------|
//! | `AssetPegs` | `"PegHash:" ++ hash bytes`| `bincode(AssetPeg)`|
//! | `FiatPegs`  | `"PegHash:" ++ hash bytes`| `bincode(FiatPeg)` |
//!
//! The fixed tag keeps peg records enumerable with one prefix scan and
//! leaves room for future record kinds in the same namespace. Iteration
//! order is byte order of the keys, which is byte order of the hashes.

pub mod batch;
pub mod db;
pub mod memory;

pub use batch::TxContext;
pub use db::LedgerDb;
pub use memory::MemStore;

use thiserror::Error;

use crate::config::PEG_KEY_PREFIX;
use crate::config::{TREE_ASSET_PEGS, TREE_FIAT_PEGS};
use crate::types::{AssetPeg, FiatPeg, PegHash};
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing engine failed. Carries the backend's own message.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

// ---------------------------------------------------------------------------
// Namespaces and keys
// ---------------------------------------------------------------------------

/// The keyspaces a store keeps apart. One per peg kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Namespace {
    /// Asset peg records.
    AssetPegs,
    /// Fiat peg records.
    FiatPegs,
}

impl Namespace {
    /// The sled tree name backing this namespace.
    pub fn tree_name(self) -> &'static str {
        match self {
            Namespace::AssetPegs => TREE_ASSET_PEGS,
            Namespace::FiatPegs => TREE_FIAT_PEGS,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree_name())
    }
}

/// Builds the store key for a peg record: the fixed tag followed by the
/// raw hash bytes.
pub fn peg_key(peg_hash: &PegHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(PEG_KEY_PREFIX.len() + peg_hash.len());
    key.extend_from_slice(PEG_KEY_PREFIX);
    key.extend_from_slice(peg_hash.as_bytes());
    key
}

// ---------------------------------------------------------------------------
// PegStore
// ---------------------------------------------------------------------------

/// The sorted key-value interface the ledger consumes.
///
/// Implementations must return `iterate_prefix` results in ascending key
/// order. The ledger never deletes: redemption overwrites records, so the
/// interface has no remove operation.
pub trait PegStore {
    /// Reads the value under `key`, or `None` when absent.
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// All `(key, value)` pairs whose key starts with `prefix`, in
    /// ascending key order. Materialized: peg populations are bounded by
    /// the genesis allocation, so snapshots beat streaming here.
    fn iterate_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

// ---------------------------------------------------------------------------
// Typed peg accessors
// ---------------------------------------------------------------------------

/// Loads an asset peg record by hash.
pub fn get_asset_peg<S: PegStore + ?Sized>(
    store: &S,
    peg_hash: &PegHash,
) -> Result<Option<AssetPeg>, StoreError> {
    match store.get(Namespace::AssetPegs, &peg_key(peg_hash))? {
        Some(bytes) => {
            let peg = bincode::deserialize(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(Some(peg))
        }
        None => Ok(None),
    }
}

/// Persists an asset peg record under its own hash.
pub fn set_asset_peg<S: PegStore + ?Sized>(
    store: &mut S,
    peg: &AssetPeg,
) -> Result<(), StoreError> {
    let bytes = bincode::serialize(peg).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(Namespace::AssetPegs, &peg_key(&peg.peg_hash), &bytes)
}

/// Loads a fiat peg record by hash.
pub fn get_fiat_peg<S: PegStore + ?Sized>(
    store: &S,
    peg_hash: &PegHash,
) -> Result<Option<FiatPeg>, StoreError> {
    match store.get(Namespace::FiatPegs, &peg_key(peg_hash))? {
        Some(bytes) => {
            let peg = bincode::deserialize(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            Ok(Some(peg))
        }
        None => Ok(None),
    }
}

/// Persists a fiat peg record under its own hash.
pub fn set_fiat_peg<S: PegStore + ?Sized>(store: &mut S, peg: &FiatPeg) -> Result<(), StoreError> {
    let bytes = bincode::serialize(peg).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(Namespace::FiatPegs, &peg_key(&peg.peg_hash), &bytes)
}

/// Every asset peg record, in hash order.
pub fn all_asset_pegs<S: PegStore + ?Sized>(store: &S) -> Result<Vec<AssetPeg>, StoreError> {
    store
        .iterate_prefix(Namespace::AssetPegs, PEG_KEY_PREFIX)?
        .into_iter()
        .map(|(_, bytes)| {
            bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .collect()
}

/// Every fiat peg record, in hash order.
pub fn all_fiat_pegs<S: PegStore + ?Sized>(store: &S) -> Result<Vec<FiatPeg>, StoreError> {
    store
        .iterate_prefix(Namespace::FiatPegs, PEG_KEY_PREFIX)?
        .into_iter()
        .map(|(_, bytes)| {
            bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
