//! Persistent peg store backed by sled.
//!
//! One embedded database file, one named tree per namespace, plus a meta
//! tree for bookkeeping that is not peg state (the genesis marker). All
//! writes go through the `PegStore` trait so callers cannot tell this
//! backend apart from `MemStore`.

use std::path::Path;

use sled::{Db, Tree};
use tracing::info;

use crate::config::TREE_META;

use super::{Namespace, PegStore, StoreError};

/// Meta key recording which network the store was seeded for. Present
/// exactly when genesis has been applied.
const META_GENESIS_NETWORK: &[u8] = b"genesis_network";

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// The on-disk ledger store.
pub struct LedgerDb {
    db: Db,
    asset_pegs: Tree,
    fiat_pegs: Tree,
    meta: Tree,
}

impl LedgerDb {
    /// Opens (or creates) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let store = Self::from_db(db)?;
        info!(
            path = %path.as_ref().display(),
            asset_pegs = store.asset_peg_count(),
            fiat_pegs = store.fiat_peg_count(),
            "ledger store opened"
        );
        Ok(store)
    }

    /// Opens a store that lives only as long as the process. Used by
    /// tests and by dry runs of the genesis tooling.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        let asset_pegs = db.open_tree(Namespace::AssetPegs.tree_name())?;
        let fiat_pegs = db.open_tree(Namespace::FiatPegs.tree_name())?;
        let meta = db.open_tree(TREE_META)?;
        Ok(Self {
            db,
            asset_pegs,
            fiat_pegs,
            meta,
        })
    }

    fn tree(&self, ns: Namespace) -> &Tree {
        match ns {
            Namespace::AssetPegs => &self.asset_pegs,
            Namespace::FiatPegs => &self.fiat_pegs,
        }
    }

    /// Number of asset peg records on disk.
    pub fn asset_peg_count(&self) -> usize {
        self.asset_pegs.len()
    }

    /// Number of fiat peg records on disk.
    pub fn fiat_peg_count(&self) -> usize {
        self.fiat_pegs.len()
    }

    /// The network this store was seeded for, or `None` before genesis.
    pub fn genesis_network(&self) -> Result<Option<String>, StoreError> {
        match self.meta.get(META_GENESIS_NETWORK)? {
            Some(bytes) => {
                let name = String::from_utf8(bytes.to_vec())
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(name))
            }
            None => Ok(None),
        }
    }

    /// Records that genesis ran against this store for `network`.
    pub fn mark_genesis(&self, network: &str) -> Result<(), StoreError> {
        self.meta.insert(META_GENESIS_NETWORK, network.as_bytes())?;
        Ok(())
    }

    /// Forces buffered writes to disk. sled flushes on its own cadence;
    /// hosts call this after committing a batch so an immediate crash
    /// cannot lose acknowledged state.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl PegStore for LedgerDb {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tree(ns).get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn set(&mut self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tree(ns).insert(key, value)?;
        Ok(())
    }

    fn iterate_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut pairs = Vec::new();
        for entry in self.tree(ns).scan_prefix(prefix) {
            let (key, value) = entry?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{get_asset_peg, peg_key, set_asset_peg};
    use crate::types::{Address, AssetPeg, PegHash};

    #[test]
    fn set_then_get_roundtrips() {
        let mut db = LedgerDb::open_temporary().unwrap();
        db.set(Namespace::AssetPegs, b"k", b"v").unwrap();
        assert_eq!(
            db.get(Namespace::AssetPegs, b"k").unwrap(),
            Some(b"v".to_vec())
        );
        assert_eq!(db.get(Namespace::FiatPegs, b"k").unwrap(), None);
    }

    #[test]
    fn prefix_scan_matches_memstore_ordering() {
        let mut db = LedgerDb::open_temporary().unwrap();
        for index in [7u64, 2, 4] {
            let hash = PegHash::from_index(index);
            db.set(Namespace::FiatPegs, &peg_key(&hash), hash.as_bytes())
                .unwrap();
        }
        let pairs = db
            .iterate_prefix(Namespace::FiatPegs, crate::config::PEG_KEY_PREFIX)
            .unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn typed_pegs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let hash = PegHash::from_index(42);
        let owner = Address::from_raw(vec![9u8; 20]);

        {
            let mut db = LedgerDb::open(dir.path()).unwrap();
            let peg = AssetPeg::placeholder(hash.clone(), owner.clone());
            set_asset_peg(&mut db, &peg).unwrap();
            db.flush().unwrap();
        }

        let db = LedgerDb::open(dir.path()).unwrap();
        let peg = get_asset_peg(&db, &hash).unwrap().unwrap();
        assert_eq!(peg.peg_hash, hash);
        assert_eq!(peg.owner, owner);
        assert_eq!(db.asset_peg_count(), 1);
    }

    #[test]
    fn genesis_marker_starts_absent_and_sticks() {
        let db = LedgerDb::open_temporary().unwrap();
        assert_eq!(db.genesis_network().unwrap(), None);
        db.mark_genesis("keel-mainnet").unwrap();
        assert_eq!(
            db.genesis_network().unwrap(),
            Some("keel-mainnet".to_string())
        );
    }

    #[test]
    fn counts_track_each_namespace() {
        let mut db = LedgerDb::open_temporary().unwrap();
        db.set(Namespace::AssetPegs, b"a", b"1").unwrap();
        db.set(Namespace::AssetPegs, b"b", b"2").unwrap();
        db.set(Namespace::FiatPegs, b"c", b"3").unwrap();
        assert_eq!(db.asset_peg_count(), 2);
        assert_eq!(db.fiat_peg_count(), 1);
    }
}
