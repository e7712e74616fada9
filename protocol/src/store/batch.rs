//! Write overlay for atomic instruction batches.
//!
//! A batch must either land every write of every instruction or none of
//! them. `TxContext` buffers writes in memory on top of a borrowed base
//! store and implements `PegStore` itself, so ledger operations run
//! unchanged inside a batch. The host then calls exactly one of
//! [`TxContext::commit`] or [`TxContext::discard`].

use std::collections::BTreeMap;

use super::{Namespace, PegStore, StoreError};

/// A buffered view over a base store. Reads fall through to the base
/// until shadowed by a buffered write; writes never touch the base
/// before `commit`.
pub struct TxContext<'a, S: PegStore> {
    base: &'a mut S,
    overlay: BTreeMap<(Namespace, Vec<u8>), Vec<u8>>,
}

impl<'a, S: PegStore> TxContext<'a, S> {
    /// Starts an empty overlay on `base`.
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            overlay: BTreeMap::new(),
        }
    }

    /// Number of buffered writes. Distinct keys, not set calls.
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    /// Applies every buffered write to the base store, in key order.
    ///
    /// A backend failure mid-apply leaves the base partially written;
    /// with sled that only happens when the database itself is broken,
    /// at which point the host is expected to stop serving.
    pub fn commit(self) -> Result<(), StoreError> {
        for ((ns, key), value) in self.overlay {
            self.base.set(ns, &key, &value)?;
        }
        Ok(())
    }

    /// Drops every buffered write. The base store is untouched.
    pub fn discard(self) {}
}

impl<'a, S: PegStore> PegStore for TxContext<'a, S> {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(value) = self.overlay.get(&(ns, key.to_vec())) {
            return Ok(Some(value.clone()));
        }
        self.base.get(ns, key)
    }

    fn set(&mut self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.overlay.insert((ns, key.to_vec()), value.to_vec());
        Ok(())
    }

    fn iterate_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        // Merge base and overlay through one ordered map so buffered
        // writes shadow their base counterparts and new keys slot into
        // byte order.
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.iterate_prefix(ns, prefix)?.into_iter().collect();
        for ((entry_ns, key), value) in &self.overlay {
            if *entry_ns == ns && key.starts_with(prefix) {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(merged.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
