//! # Ledger Factories
//!
//! The operations that move pegs through their lifecycle. Each factory
//! function loads current state through a [`PegStore`], checks the
//! operation's preconditions, writes replacement records, and returns the
//! audit events for the caller's sink. Nothing here commits: callers run
//! factories against a `TxContext` and decide the batch's fate afterwards.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs   — error taxonomy, typed read helpers shared by both ledgers
//! asset.rs — single-owner asset peg lifecycle (issue/send/execute/redeem)
//! fiat.rs  — multi-owner fiat peg lifecycle over owner-share accounting
//! ```
//!
//! ## Design Decisions
//!
//! - **Free functions over a store bound, not a service struct.** The
//!   factories carry no state of their own; everything they know is in
//!   the store they are handed. This keeps them equally usable against
//!   `MemStore`, `LedgerDb`, or a `TxContext` over either.
//! - **First failure wins.** No operation repairs or retries; it returns
//!   the typed error and the caller discards the context.

pub mod asset;
pub mod fiat;

use thiserror::Error;

use crate::store::{self, PegStore, StoreError};
use crate::types::{
    Address, AssetPeg, AssetWallet, FiatPeg, FiatWallet, FiatWalletError, FieldViolation, PegHash,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a ledger operation can fail with.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No asset peg record under this hash.
    #[error("asset with pegHash {0} not found")]
    AssetNotFound(PegHash),

    /// No fiat peg record under this hash.
    #[error("fiat with pegHash {0} not found")]
    FiatNotFound(PegHash),

    /// The acting address does not hold the peg (owner mismatch on a
    /// direct operation, escrow mismatch on an order operation).
    #[error("address {address} is not authorized for this peg")]
    Unauthorized { address: Address },

    /// Issuance data failed the field rules.
    #[error(transparent)]
    InvalidField(#[from] FieldViolation),

    /// Coin selection could not cover the requested amount. Produced by
    /// hosts that drive `split_by_amount`/`redeem_by_amount`; the factory
    /// operations themselves take pre-selected wallets.
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: i64, available: i64 },

    /// A per-peg owner-share mutation did not resolve to exactly one
    /// subtracted and one credited entry.
    #[error("owner share accounting for peg {0} did not balance")]
    MalformedTransfer(PegHash),

    /// The store itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FiatWalletError> for LedgerError {
    fn from(err: FiatWalletError) -> Self {
        match err {
            FiatWalletError::UnmatchedFragment(hash) => LedgerError::FiatNotFound(hash),
            FiatWalletError::MalformedTransfer(hash) => LedgerError::MalformedTransfer(hash),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed reads
// ---------------------------------------------------------------------------

/// Loads the asset peg under `peg_hash`, or fails with `AssetNotFound`.
pub fn asset_peg<S: PegStore>(store: &S, peg_hash: &PegHash) -> Result<AssetPeg, LedgerError> {
    store::get_asset_peg(store, peg_hash)?
        .ok_or_else(|| LedgerError::AssetNotFound(peg_hash.clone()))
}

/// Loads the fiat peg under `peg_hash`, or fails with `FiatNotFound`.
pub fn fiat_peg<S: PegStore>(store: &S, peg_hash: &PegHash) -> Result<FiatPeg, LedgerError> {
    store::get_fiat_peg(store, peg_hash)?
        .ok_or_else(|| LedgerError::FiatNotFound(peg_hash.clone()))
}

/// The live asset pegs held by `address`, as a hash-ordered wallet.
///
/// Pool placeholders are inventory, not holdings, and are skipped even
/// though their owner field names the issuer.
pub fn owned_assets<S: PegStore>(store: &S, address: &Address) -> Result<AssetWallet, LedgerError> {
    let pegs = store::all_asset_pegs(store)?
        .into_iter()
        .filter(|peg| !peg.is_placeholder() && peg.owner == *address)
        .collect();
    Ok(AssetWallet::from_pegs(pegs))
}

/// The fiat share fragments held by `address`, as a hash-ordered wallet.
///
/// Each fragment is the stored peg reshaped to the holder's view:
/// `transaction_amount` is the holder's share and the owner roster is
/// dropped. Fragments come back ready for use as an instruction wallet.
/// Zero-amount entries are skipped.
pub fn owned_fiat_fragments<S: PegStore>(
    store: &S,
    address: &Address,
) -> Result<FiatWallet, LedgerError> {
    let mut fragments = Vec::new();
    for peg in store::all_fiat_pegs(store)? {
        let Some(share) = peg.owners.iter().find(|o| o.address == *address && o.amount != 0)
        else {
            continue;
        };
        fragments.push(FiatPeg {
            peg_hash: peg.peg_hash.clone(),
            transaction_id: peg.transaction_id.clone(),
            transaction_amount: share.amount,
            redeemed_amount: 0,
            owners: Vec::new(),
        });
    }
    Ok(FiatWallet::from_pegs(fragments))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
