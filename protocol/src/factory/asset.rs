//! Asset peg lifecycle: issue, send to order, execute from order, redeem.
//!
//! An asset peg has exactly one owner at any moment, so every operation
//! here is a guarded ownership rewrite. Order custody is expressed through
//! the owner field itself: sending to an order sets the owner to the
//! derived escrow pseudo-address, executing sets it to the counterparty.

use tracing::debug;

use crate::escrow::escrow_address;
use crate::events::Event;
use crate::store::{set_asset_peg, PegStore};
use crate::types::{Address, AssetPeg, PegHash};

use super::{asset_peg, LedgerError};

/// Issues a live asset peg into a reserved hash.
///
/// The hash named by `peg` must hold a pool placeholder owned by
/// `issuer`; the placeholder is replaced wholesale by `peg` with its
/// hash carried over and `recipient` as the first owner.
pub fn issue<S: PegStore>(
    store: &mut S,
    issuer: &Address,
    recipient: &Address,
    peg: AssetPeg,
) -> Result<Vec<Event>, LedgerError> {
    let stored = asset_peg(store, &peg.peg_hash)?;
    if stored.owner != *issuer {
        return Err(LedgerError::Unauthorized {
            address: issuer.clone(),
        });
    }
    peg.validate()?;

    let mut issued = peg;
    issued.peg_hash = stored.peg_hash;
    issued.owner = recipient.clone();
    set_asset_peg(store, &issued)?;

    debug!(peg_hash = %issued.peg_hash, recipient = %recipient, "asset issued");
    Ok(vec![Event::asset_issued(recipient, issuer, &issued.peg_hash)])
}

/// Retires an asset peg: the record collapses back to a placeholder
/// owned by `recipient`, releasing the hash for a future issuance.
pub fn redeem<S: PegStore>(
    store: &mut S,
    owner: &Address,
    recipient: &Address,
    peg_hash: &PegHash,
) -> Result<Vec<Event>, LedgerError> {
    let stored = asset_peg(store, peg_hash)?;
    if stored.owner != *owner {
        return Err(LedgerError::Unauthorized {
            address: owner.clone(),
        });
    }

    let retired = AssetPeg::placeholder(stored.peg_hash, recipient.clone());
    set_asset_peg(store, &retired)?;

    debug!(peg_hash = %peg_hash, last_owner = %owner, "asset redeemed");
    Ok(vec![Event::asset_redeemed(recipient, owner, peg_hash)])
}

/// Moves an asset peg from its owner into the escrow of an order between
/// `from` and `to`.
pub fn send_to_order<S: PegStore>(
    store: &mut S,
    from: &Address,
    to: &Address,
    peg_hash: &PegHash,
) -> Result<Vec<Event>, LedgerError> {
    let mut stored = asset_peg(store, peg_hash)?;
    if stored.owner != *from {
        return Err(LedgerError::Unauthorized {
            address: from.clone(),
        });
    }

    stored.owner = escrow_address(from, to, peg_hash);
    set_asset_peg(store, &stored)?;

    debug!(peg_hash = %peg_hash, from = %from, to = %to, "asset sent to order");
    Ok(vec![Event::asset_sent(to, from, peg_hash)])
}

/// Settles an escrowed asset peg to `to`.
///
/// The release key is recomputed from `(from, to, peg_hash)`; only the
/// pairing that locked the peg can unlock it.
pub fn execute_order<S: PegStore>(
    store: &mut S,
    from: &Address,
    to: &Address,
    peg_hash: &PegHash,
) -> Result<Vec<Event>, LedgerError> {
    let mut stored = asset_peg(store, peg_hash)?;
    if stored.owner != escrow_address(from, to, peg_hash) {
        return Err(LedgerError::Unauthorized {
            address: from.clone(),
        });
    }

    stored.owner = to.clone();
    set_asset_peg(store, &stored)?;

    debug!(peg_hash = %peg_hash, from = %from, to = %to, "asset order executed");
    Ok(vec![Event::asset_executed(to, from, peg_hash)])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
