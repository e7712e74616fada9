//! Fiat peg lifecycle: issue, send to order, execute from order, redeem.
//!
//! Fiat custody is fractional, so every operation here runs the owner-share
//! algebra from `types::fiat` against freshly loaded records and persists
//! the results. Order custody again lives in the ownership data itself: an
//! escrowed share is an owner entry under the derived escrow address.
//!
//! Execution is a two-step settlement. The main transfer settles the
//! requested share out of escrow to the counterparty; a second pass then
//! returns any balance still sitting under the escrow address to the
//! payer, one fragment at a time. Partially executed orders therefore
//! leave nothing stranded in escrow.

use tracing::debug;

use crate::escrow::escrow_address;
use crate::events::Event;
use crate::store::{set_fiat_peg, PegStore};
use crate::types::fiat::{redeem_owner_share, transfer_owner_share};
use crate::types::{Address, FiatOwner, FiatPeg, FiatWallet, PegHash};

use super::{fiat_peg, LedgerError};

/// Issues a live fiat peg into a reserved hash.
///
/// The stored placeholder is replaced by `peg` with its hash carried
/// over and a single owner entry crediting `recipient` with the full
/// transaction amount.
pub fn issue<S: PegStore>(
    store: &mut S,
    issuer: &Address,
    recipient: &Address,
    peg: FiatPeg,
) -> Result<Vec<Event>, LedgerError> {
    let stored = fiat_peg(store, &peg.peg_hash)?;
    peg.validate()?;

    let mut issued = peg;
    issued.peg_hash = stored.peg_hash;
    issued.redeemed_amount = 0;
    issued.owners = vec![FiatOwner {
        address: recipient.clone(),
        amount: issued.transaction_amount,
    }];
    set_fiat_peg(store, &issued)?;

    debug!(peg_hash = %issued.peg_hash, recipient = %recipient, "fiat issued");
    Ok(vec![Event::fiat_issued(recipient, issuer, &issued.peg_hash)])
}

/// Moves fiat shares from `from` into the escrow of an order between
/// `from` and `to`.
///
/// `peg_hash` names the order (the asset peg under negotiation); the
/// wallet's fragments name the fiat pegs whose shares move.
pub fn send_to_order<S: PegStore>(
    store: &mut S,
    from: &Address,
    to: &Address,
    peg_hash: &PegHash,
    wallet: &FiatWallet,
) -> Result<Vec<Event>, LedgerError> {
    let escrow = escrow_address(from, to, peg_hash);
    transfer_shares(store, wallet, from, &escrow)?;

    debug!(order = %peg_hash, from = %from, to = %to, "fiat sent to order");
    Ok(vec![Event::fiat_sent(&escrow, from, peg_hash)])
}

/// Settles escrowed fiat out of an order between `from` and `to`.
///
/// Step one transfers the wallet's shares from the escrow address to
/// `to`. Step two walks the same fragments and, wherever the escrow
/// address still holds a non-zero share of that peg, returns it to
/// `from`. Each successful inner transfer contributes its own event;
/// the first failing one aborts the operation.
pub fn execute_order<S: PegStore>(
    store: &mut S,
    from: &Address,
    to: &Address,
    peg_hash: &PegHash,
    wallet: &FiatWallet,
) -> Result<Vec<Event>, LedgerError> {
    let escrow = escrow_address(from, to, peg_hash);
    let mut events = Vec::new();

    transfer_shares(store, wallet, &escrow, to)?;
    events.push(Event::fiat_executed(to, &escrow, peg_hash));

    for fragment in wallet.pegs() {
        let stored = fiat_peg(store, &fragment.peg_hash)?;
        let residual = stored
            .owners
            .iter()
            .find(|o| o.address == escrow && o.amount != 0)
            .map(|o| o.amount);
        if let Some(amount) = residual {
            let mut returned = stored;
            returned.transaction_amount = amount;
            let returned = FiatWallet::from_pegs(vec![returned]);
            transfer_shares(store, &returned, &escrow, from)?;
            events.push(Event::fiat_executed(from, &escrow, peg_hash));
        }
    }

    debug!(
        order = %peg_hash,
        from = %from,
        to = %to,
        transfers = events.len(),
        "fiat order executed"
    );
    Ok(events)
}

/// Permanently retires the wallet's fragments from `redeemer`'s shares.
pub fn redeem<S: PegStore>(
    store: &mut S,
    redeemer: &Address,
    wallet: &FiatWallet,
) -> Result<Vec<Event>, LedgerError> {
    let mut stored = Vec::with_capacity(wallet.len());
    for fragment in wallet.pegs() {
        stored.push(fiat_peg(store, &fragment.peg_hash)?);
    }

    let updated = redeem_owner_share(wallet, stored, redeemer)?;
    for peg in &updated {
        set_fiat_peg(store, peg)?;
    }

    debug!(redeemer = %redeemer, fragments = wallet.len(), "fiat redeemed");
    Ok(vec![Event::fiat_redeemed(redeemer)])
}

/// Loads every fragment's stored peg, applies one owner-share transfer
/// across them, and persists the results. Fails before the first write
/// if any fragment cannot be resolved cleanly.
fn transfer_shares<S: PegStore>(
    store: &mut S,
    wallet: &FiatWallet,
    from: &Address,
    to: &Address,
) -> Result<(), LedgerError> {
    let mut stored = Vec::with_capacity(wallet.len());
    for fragment in wallet.pegs() {
        stored.push(fiat_peg(store, &fragment.peg_hash)?);
    }

    let updated = transfer_owner_share(wallet, stored, from, to)?;
    for peg in &updated {
        set_fiat_peg(store, peg)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
