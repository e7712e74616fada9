//! Asset peg records and the hash-ordered wallets that hold them.
//!
//! An asset peg is the unit of custody for one tokenized real-world asset:
//! exactly one owner at any time, identified forever by its peg hash.
//! Wallets keep their pegs sorted by hash so membership checks are binary
//! searches and iteration matches the store's key order.

use serde::{Deserialize, Serialize};

use crate::types::address::Address;
use crate::types::peg_hash::PegHash;
use crate::types::FieldViolation;

// ---------------------------------------------------------------------------
// AssetPeg
// ---------------------------------------------------------------------------

/// A single-owner claim on one tokenized real-world asset.
///
/// The record in the store is always the latest snapshot; operations build
/// a replacement value and persist it under the same `peg_hash`. While a
/// peg sits in an order its `owner` is the derived escrow pseudo-address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPeg {
    /// Identifier carried unchanged through the peg's whole lifecycle.
    pub peg_hash: PegHash,
    /// Proof-of-existence reference for the underlying paperwork.
    pub document_hash: String,
    /// Kind of asset backing the peg. Letters and spaces only.
    pub asset_type: String,
    /// Number of units backing the peg. Positive.
    pub asset_quantity: i64,
    /// Agreed price of the backing units. Positive.
    pub asset_price: i64,
    /// Unit the quantity is denominated in. Letters only.
    pub quantity_unit: String,
    /// Current holder.
    pub owner: Address,
    /// Set while the peg is held in a moderated account-side wallet.
    /// Ledger operations carry it through untouched.
    pub locked: bool,
    /// True when issuance goes through a supervising moderator.
    pub moderated: bool,
    /// Optional exclusive counterparty allowed to take the other side
    /// of an order on this peg.
    pub taker: Option<Address>,
}

impl AssetPeg {
    /// Placeholder record: a hash and a holder, everything else zeroed.
    ///
    /// Genesis pre-allocation writes these to reserve hashes for the
    /// issuer, and redemption writes one to retire a peg in place.
    pub fn placeholder(peg_hash: PegHash, owner: Address) -> Self {
        Self {
            peg_hash,
            document_hash: String::new(),
            asset_type: String::new(),
            asset_quantity: 0,
            asset_price: 0,
            quantity_unit: String::new(),
            owner,
            locked: false,
            moderated: false,
            taker: None,
        }
    }

    /// True for pool inventory: a reserved hash that no issuance has
    /// filled in yet (or that redemption has emptied again). Issued pegs
    /// always carry a document hash, so its absence is the marker.
    pub fn is_placeholder(&self) -> bool {
        self.document_hash.is_empty()
    }

    /// Checks the issuance field rules.
    ///
    /// Placeholders fail this on purpose: a record only has to validate
    /// when it enters the store through issuance.
    pub fn validate(&self) -> Result<(), FieldViolation> {
        if self.document_hash.is_empty() {
            return Err(FieldViolation {
                field: "documentHash",
                reason: "must not be empty".to_string(),
            });
        }
        if self.asset_type.is_empty()
            || !self
                .asset_type
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == ' ')
        {
            return Err(FieldViolation {
                field: "assetType",
                reason: "must be non-empty, letters and spaces only".to_string(),
            });
        }
        if self.asset_quantity <= 0 {
            return Err(FieldViolation {
                field: "assetQuantity",
                reason: "must be positive".to_string(),
            });
        }
        if self.asset_price <= 0 {
            return Err(FieldViolation {
                field: "assetPrice",
                reason: "must be positive".to_string(),
            });
        }
        if self.quantity_unit.is_empty()
            || !self.quantity_unit.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(FieldViolation {
                field: "quantityUnit",
                reason: "must be non-empty, letters only".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AssetWallet
// ---------------------------------------------------------------------------

/// An ordered set of asset pegs, sorted by peg hash.
///
/// Models an account-side holding: the issuer's pool of reserved hashes,
/// or the asset leg of an order record. At most one peg per hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetWallet(Vec<AssetPeg>);

impl AssetWallet {
    /// An empty wallet.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a wallet from pegs, sorting them into canonical hash order.
    pub fn from_pegs(pegs: Vec<AssetPeg>) -> Self {
        let mut wallet = Self(pegs);
        wallet.sort_by_peg_hash();
        wallet
    }

    /// Number of pegs held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no pegs are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The pegs in hash order.
    pub fn pegs(&self) -> &[AssetPeg] {
        &self.0
    }

    fn sort_by_peg_hash(&mut self) {
        self.0.sort_by(|a, b| a.peg_hash.cmp(&b.peg_hash));
    }

    /// Binary search for a peg by hash.
    pub fn position(&self, peg_hash: &PegHash) -> Option<usize> {
        self.0
            .binary_search_by(|peg| peg.peg_hash.cmp(peg_hash))
            .ok()
    }

    /// Looks up a peg by hash.
    pub fn get(&self, peg_hash: &PegHash) -> Option<&AssetPeg> {
        self.position(peg_hash).map(|i| &self.0[i])
    }

    /// Adds a peg, keeping hash order. A hash already present wins:
    /// the wallet is left unchanged and `false` is returned.
    pub fn add(&mut self, peg: AssetPeg) -> bool {
        if self.position(&peg.peg_hash).is_some() {
            return false;
        }
        self.0.push(peg);
        self.sort_by_peg_hash();
        true
    }

    /// Removes and returns the peg with the given hash, if present.
    pub fn subtract(&mut self, peg_hash: &PegHash) -> Option<AssetPeg> {
        let i = self.position(peg_hash)?;
        Some(self.0.remove(i))
    }

    /// Issues a peg out of this wallet's reserved pool.
    ///
    /// Pops the last reserved peg, stamps its hash onto the outgoing
    /// record, marks the record locked, and files it in `receiver`.
    /// Returns the stamped record, or `None` when the pool is exhausted.
    pub fn issue_into(&mut self, receiver: &mut AssetWallet, mut peg: AssetPeg) -> Option<AssetPeg> {
        let reserved = self.0.pop()?;
        peg.peg_hash = reserved.peg_hash;
        peg.locked = true;
        receiver.add(peg.clone());
        Some(peg)
    }

    /// Clears the locked flag on a held peg in place.
    /// Returns `false` when the hash is not in this wallet.
    pub fn release(&mut self, peg_hash: &PegHash) -> bool {
        match self.position(peg_hash) {
            Some(i) => {
                self.0[i].locked = false;
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
