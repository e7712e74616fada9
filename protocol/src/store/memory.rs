//! In-memory peg store over ordered maps.
//!
//! Backs unit tests, the genesis tooling, and any caller that wants ledger
//! semantics without a disk footprint. Iteration order matches `LedgerDb`
//! because both walk keys in byte order.

use std::collections::BTreeMap;

use super::{Namespace, PegStore, StoreError};

/// A `PegStore` held entirely in memory. One ordered map per namespace.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    asset_pegs: BTreeMap<Vec<u8>, Vec<u8>>,
    fiat_pegs: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a namespace.
    pub fn len(&self, ns: Namespace) -> usize {
        self.map(ns).len()
    }

    /// True when a namespace holds no records.
    pub fn is_empty(&self, ns: Namespace) -> bool {
        self.map(ns).is_empty()
    }

    fn map(&self, ns: Namespace) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        match ns {
            Namespace::AssetPegs => &self.asset_pegs,
            Namespace::FiatPegs => &self.fiat_pegs,
        }
    }

    fn map_mut(&mut self, ns: Namespace) -> &mut BTreeMap<Vec<u8>, Vec<u8>> {
        match ns {
            Namespace::AssetPegs => &mut self.asset_pegs,
            Namespace::FiatPegs => &mut self.fiat_pegs,
        }
    }
}

impl PegStore for MemStore {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map(ns).get(key).cloned())
    }

    fn set(&mut self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.map_mut(ns).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn iterate_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        // BTreeMap range scans stay sorted; stop at the first key past the
        // prefix instead of filtering the whole map.
        let mut pairs = Vec::new();
        for (key, value) in self.map(ns).range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            pairs.push((key.clone(), value.clone()));
        }
        Ok(pairs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
