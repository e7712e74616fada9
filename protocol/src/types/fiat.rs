//! Fiat peg records, partial ownership, and the wallet algebra.
//!
//! Fiat pegs are where the accounting gets interesting. A single peg record
//! can be owned by several parties at once, each holding an `(address,
//! amount)` share, and transfer requests arrive as wallets of fragments
//! that a greedy splitter carved out of someone's holdings.
//!
//! Two sort orders coexist on the same wallet type and are never
//! interchangeable: matching and merging wants peg-hash order, greedy
//! selection wants ascending balance. Every sort here is an explicit,
//! named call so the reader always knows which order a wallet is in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{TRANSACTION_ID_MAX_LENGTH, TRANSACTION_ID_MIN_LENGTH};
use crate::types::address::Address;
use crate::types::peg_hash::PegHash;
use crate::types::FieldViolation;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a per-peg owner-share mutation.
///
/// Owner-share changes are all-or-nothing across every fragment in the
/// request: the first peg that cannot be resolved cleanly fails the whole
/// call and the caller discards the partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiatWalletError {
    /// A fragment referenced a peg that is not in the stored set.
    #[error("no stored fiat peg matches fragment {0}")]
    UnmatchedFragment(PegHash),

    /// The bookkeeping did not land on exactly one ledger entry per side.
    /// Covers insufficient balance, a missing holder entry, and duplicate
    /// entries for one address alike.
    #[error("owner share change for peg {0} did not resolve to exactly one entry per side")]
    MalformedTransfer(PegHash),
}

// ---------------------------------------------------------------------------
// FiatOwner
// ---------------------------------------------------------------------------

/// One party's current share of a fiat peg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatOwner {
    /// The holding party. May be an escrow pseudo-address.
    pub address: Address,
    /// Share currently claimed, in the smallest denomination.
    pub amount: i64,
}

// ---------------------------------------------------------------------------
// FiatPeg
// ---------------------------------------------------------------------------

/// A claim on fiat currency with simultaneous partial ownership.
///
/// `transaction_amount` is the live balance the record still represents;
/// `redeemed_amount` accumulates everything permanently retired. The
/// `owners` list carries at most one entry per address. A share
/// transferred down to exactly zero keeps its entry with amount 0 (later
/// additions reuse it); only redemption removes entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatPeg {
    /// Identifier carried unchanged through the peg's whole lifecycle.
    pub peg_hash: PegHash,
    /// Reference of the off-chain fiat transaction backing the peg.
    /// Uppercase alphanumeric, 2 to 40 characters.
    pub transaction_id: String,
    /// Live balance represented by this record. Positive at issuance.
    pub transaction_amount: i64,
    /// Cumulative amount permanently retired from this record.
    pub redeemed_amount: i64,
    /// Current shares, at most one entry per address.
    pub owners: Vec<FiatOwner>,
}

impl FiatPeg {
    /// Placeholder record: a hash and nothing else. Genesis pre-allocation
    /// writes these to reserve hashes for issuance.
    pub fn placeholder(peg_hash: PegHash) -> Self {
        Self {
            peg_hash,
            transaction_id: String::new(),
            transaction_amount: 0,
            redeemed_amount: 0,
            owners: Vec::new(),
        }
    }

    /// Checks the issuance field rules.
    pub fn validate(&self) -> Result<(), FieldViolation> {
        let id_len = self.transaction_id.chars().count();
        if id_len < TRANSACTION_ID_MIN_LENGTH
            || id_len > TRANSACTION_ID_MAX_LENGTH
            || !self
                .transaction_id
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(FieldViolation {
                field: "transactionID",
                reason: format!(
                    "must be {} to {} uppercase alphanumeric characters",
                    TRANSACTION_ID_MIN_LENGTH, TRANSACTION_ID_MAX_LENGTH
                ),
            });
        }
        if self.transaction_amount <= 0 {
            return Err(FieldViolation {
                field: "transactionAmount",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FiatWallet
// ---------------------------------------------------------------------------

/// An ordered list of fiat peg fragments.
///
/// The unit of every fiat request: issuance carries one peg, transfers and
/// redemptions carry the fragments a splitter produced. Construction
/// preserves the given order — `redeem_by_amount` in particular consumes
/// fragments in presented order, so no constructor sorts behind the
/// caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatWallet(Vec<FiatPeg>);

impl FiatWallet {
    /// An empty wallet.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps fragments in the order given.
    pub fn from_pegs(pegs: Vec<FiatPeg>) -> Self {
        Self(pegs)
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no fragments are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The fragments in their current order.
    pub fn pegs(&self) -> &[FiatPeg] {
        &self.0
    }

    /// Appends a fragment without any matching or sorting.
    pub fn push(&mut self, peg: FiatPeg) {
        self.0.push(peg);
    }

    /// Sum of the live balances of all fragments.
    pub fn balance(&self) -> i64 {
        self.0.iter().map(|peg| peg.transaction_amount).sum()
    }

    /// Sorts fragments by peg hash, the order for matching and merging.
    pub fn sort_by_peg_hash(&mut self) {
        self.0.sort_by(|a, b| a.peg_hash.cmp(&b.peg_hash));
    }

    /// Sorts fragments by ascending live balance, the order the greedy
    /// selection algorithms consume.
    pub fn sort_by_ascending_balance(&mut self) {
        self.0
            .sort_by(|a, b| a.transaction_amount.cmp(&b.transaction_amount));
    }

    /// Greedy coin-selection: carves exactly `amount` out of this wallet.
    ///
    /// Sorts ascending by balance, then accumulates whole fragments while
    /// they fit; the fragment that crosses the threshold is split into an
    /// exact remainder (into `selected`) and a leftover (into
    /// `remainder`); fragments past the threshold pass through untouched.
    ///
    /// All-or-nothing: when the wallet total is below `amount` both
    /// returned wallets are empty and nothing was spent. On success
    /// `selected` totals exactly `amount`, value is conserved across the
    /// pair, and both outputs come back sorted ascending.
    pub fn split_by_amount(self, amount: i64) -> (FiatWallet, FiatWallet) {
        let mut source = self;
        source.sort_by_ascending_balance();

        let mut selected = Vec::new();
        let mut remainder = Vec::new();
        let mut collected: i64 = 0;

        for mut peg in source.0 {
            if collected < amount {
                let needed = amount - collected;
                if peg.transaction_amount <= needed {
                    collected += peg.transaction_amount;
                    selected.push(peg);
                } else {
                    let mut exact = peg.clone();
                    exact.transaction_amount = needed;
                    peg.transaction_amount -= needed;
                    remainder.push(peg);
                    selected.push(exact);
                    collected = amount;
                }
            } else {
                remainder.push(peg);
            }
        }

        if collected == amount {
            let mut selected = FiatWallet(selected);
            let mut remainder = FiatWallet(remainder);
            selected.sort_by_ascending_balance();
            remainder.sort_by_ascending_balance();
            (selected, remainder)
        } else {
            (FiatWallet::new(), FiatWallet::new())
        }
    }

    /// Greedy retirement walk over the fragments in presented order.
    ///
    /// Unlike [`split_by_amount`](Self::split_by_amount) this does NOT
    /// sort first: callers wanting smallest-first retirement sort
    /// explicitly. Fully consumed fragments land in `emptied` unchanged;
    /// the fragment that crosses the threshold is stamped in place
    /// (`transaction_amount` decremented, `redeemed_amount` set to the
    /// consumed slice) and lands in `redeemer_share` along with every
    /// untouched later fragment.
    ///
    /// Same all-or-nothing contract as the splitter: a shortfall returns
    /// two empty wallets. On success both outputs are sorted ascending.
    pub fn redeem_by_amount(self, amount: i64) -> (FiatWallet, FiatWallet) {
        let mut emptied = Vec::new();
        let mut redeemer_share = Vec::new();
        let mut collected: i64 = 0;

        for mut peg in self.0 {
            if collected < amount {
                let needed = amount - collected;
                if peg.transaction_amount <= needed {
                    collected += peg.transaction_amount;
                    emptied.push(peg);
                } else {
                    peg.transaction_amount -= needed;
                    peg.redeemed_amount = needed;
                    redeemer_share.push(peg);
                    collected = amount;
                }
            } else {
                redeemer_share.push(peg);
            }
        }

        if collected == amount {
            let mut emptied = FiatWallet(emptied);
            let mut redeemer_share = FiatWallet(redeemer_share);
            emptied.sort_by_ascending_balance();
            redeemer_share.sort_by_ascending_balance();
            (emptied, redeemer_share)
        } else {
            (FiatWallet::new(), FiatWallet::new())
        }
    }

    /// Merges `incoming` fragments into this wallet by peg hash.
    ///
    /// A hash match adds the balances and the incoming record's
    /// attributes win wholesale; an unmatched fragment is appended. The
    /// result is re-sorted by peg hash for lookup consistency.
    pub fn merge_into(&mut self, incoming: FiatWallet) {
        for mut in_peg in incoming.0 {
            match self.0.iter().position(|p| p.peg_hash == in_peg.peg_hash) {
                Some(i) => {
                    in_peg.transaction_amount += self.0[i].transaction_amount;
                    self.0[i] = in_peg;
                }
                None => self.0.push(in_peg),
            }
        }
        self.sort_by_peg_hash();
    }

    /// Removes the first fragment matching each hash in `to_remove`.
    /// The survivors are re-sorted by peg hash.
    pub fn subtract_wallet(&mut self, to_remove: &FiatWallet) {
        for gone in to_remove.pegs() {
            if let Some(i) = self.0.iter().position(|p| p.peg_hash == gone.peg_hash) {
                self.0.remove(i);
            }
        }
        self.sort_by_peg_hash();
    }
}

// ---------------------------------------------------------------------------
// Owner-share mutations
// ---------------------------------------------------------------------------

/// Moves each fragment's balance between owner entries on the stored pegs.
///
/// `stored` carries the current store snapshot of every peg the fragments
/// reference, one looked-up record per fragment. For each fragment the
/// matching record's owner list is walked once: the `from` entry holding
/// at least the fragment's balance is decremented, the `to` entry is
/// incremented, and a missing `to` entry is appended with the fragment's
/// balance. Exactly one subtraction and exactly one addition must happen
/// per peg, anything else fails the whole call. A `from` entry drained to
/// exactly zero stays in the list with amount 0.
pub fn transfer_owner_share(
    fragments: &FiatWallet,
    mut stored: Vec<FiatPeg>,
    from: &Address,
    to: &Address,
) -> Result<Vec<FiatPeg>, FiatWalletError> {
    for fragment in fragments.pegs() {
        let slot = stored
            .iter_mut()
            .find(|p| p.peg_hash == fragment.peg_hash)
            .ok_or_else(|| FiatWalletError::UnmatchedFragment(fragment.peg_hash.clone()))?;

        let mut subtracted = 0;
        let mut added = 0;
        for owner in slot.owners.iter_mut() {
            if owner.address == *from && owner.amount >= fragment.transaction_amount {
                owner.amount -= fragment.transaction_amount;
                subtracted += 1;
            } else if owner.address == *to {
                owner.amount += fragment.transaction_amount;
                added += 1;
            }
        }
        if added == 0 {
            slot.owners.push(FiatOwner {
                address: to.clone(),
                amount: fragment.transaction_amount,
            });
            added += 1;
        }
        if subtracted != 1 || added != 1 {
            return Err(FiatWalletError::MalformedTransfer(fragment.peg_hash.clone()));
        }
    }
    Ok(stored)
}

/// Permanently retires each fragment's `redeemed_amount` from the stored
/// pegs on behalf of `from`.
///
/// The `from` owner entry is decremented when it holds more than the
/// retired slice and removed entirely when it holds exactly that much.
/// Exactly one subtraction must happen per peg or the call fails. The
/// stored record is then stamped: live balance down, cumulative
/// `redeemed_amount` up.
pub fn redeem_owner_share(
    fragments: &FiatWallet,
    mut stored: Vec<FiatPeg>,
    from: &Address,
) -> Result<Vec<FiatPeg>, FiatWalletError> {
    for fragment in fragments.pegs() {
        let slot = stored
            .iter_mut()
            .find(|p| p.peg_hash == fragment.peg_hash)
            .ok_or_else(|| FiatWalletError::UnmatchedFragment(fragment.peg_hash.clone()))?;

        let mut subtracted = 0;
        let mut i = 0;
        while i < slot.owners.len() {
            let owner = &mut slot.owners[i];
            if owner.address == *from && owner.amount > fragment.redeemed_amount {
                owner.amount -= fragment.redeemed_amount;
                subtracted += 1;
                i += 1;
            } else if owner.address == *from && owner.amount == fragment.redeemed_amount {
                slot.owners.remove(i);
                subtracted += 1;
            } else {
                i += 1;
            }
        }
        if subtracted != 1 {
            return Err(FiatWalletError::MalformedTransfer(fragment.peg_hash.clone()));
        }
        slot.transaction_amount -= fragment.redeemed_amount;
        slot.redeemed_amount += fragment.redeemed_amount;
    }
    Ok(stored)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::from_raw(vec![tag; 20])
    }

    fn peg(index: u64, amount: i64, owner: Address) -> FiatPeg {
        FiatPeg {
            peg_hash: PegHash::from_index(index),
            transaction_id: format!("TX{:04}", index),
            transaction_amount: amount,
            redeemed_amount: 0,
            owners: vec![FiatOwner {
                address: owner,
                amount,
            }],
        }
    }

    fn owner_sum(p: &FiatPeg) -> i64 {
        p.owners.iter().map(|o| o.amount).sum()
    }

    // --- validation ---

    #[test]
    fn validate_accepts_well_formed_peg() {
        assert!(peg(1, 100, addr(1)).validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_transaction_ids() {
        let too_long = "A".repeat(41);
        for bad in ["", "A", "tx123", "TX 99", too_long.as_str()] {
            let mut p = peg(1, 100, addr(1));
            p.transaction_id = bad.to_string();
            assert_eq!(p.validate().unwrap_err().field, "transactionID", "id: {:?}", bad);
        }
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        let mut p = peg(1, 100, addr(1));
        p.transaction_amount = 0;
        assert_eq!(p.validate().unwrap_err().field, "transactionAmount");
    }

    // --- greedy split ---

    #[test]
    fn split_single_peg_into_sixty_forty() {
        let wallet = FiatWallet::from_pegs(vec![peg(1, 100, addr(3))]);
        let (selected, remainder) = wallet.split_by_amount(60);

        assert_eq!(selected.balance(), 60);
        assert_eq!(remainder.balance(), 40);
        assert_eq!(selected.pegs()[0].peg_hash, PegHash::from_index(1));
        assert_eq!(remainder.pegs()[0].peg_hash, PegHash::from_index(1));
    }

    #[test]
    fn split_beyond_total_returns_two_empty_wallets() {
        let wallet = FiatWallet::from_pegs(vec![peg(1, 100, addr(3))]);
        let (selected, remainder) = wallet.split_by_amount(150);
        assert!(selected.is_empty());
        assert!(remainder.is_empty());
    }

    #[test]
    fn split_consumes_whole_pegs_then_splits_the_crossing_one() {
        // Deliberately unsorted input; the splitter sorts ascending first,
        // so the walk sees 10, 25, 40.
        let wallet = FiatWallet::from_pegs(vec![
            peg(2, 25, addr(1)),
            peg(3, 40, addr(1)),
            peg(1, 10, addr(1)),
        ]);
        let (selected, remainder) = wallet.split_by_amount(50);

        assert_eq!(selected.balance(), 50);
        assert_eq!(remainder.balance(), 25);
        // 10 and 25 are consumed whole, 40 splits into 15 + 25.
        let selected_amounts: Vec<_> = selected
            .pegs()
            .iter()
            .map(|p| p.transaction_amount)
            .collect();
        assert_eq!(selected_amounts, vec![10, 15, 25]);
        assert_eq!(remainder.pegs()[0].transaction_amount, 25);
        assert_eq!(remainder.pegs()[0].peg_hash, PegHash::from_index(3));
    }

    #[test]
    fn split_conserves_total_value() {
        let wallet = FiatWallet::from_pegs(vec![
            peg(1, 7, addr(1)),
            peg(2, 13, addr(1)),
            peg(3, 29, addr(1)),
        ]);
        let total = wallet.balance();
        for amount in [1, 7, 20, 48, 49] {
            let (selected, remainder) = wallet.clone().split_by_amount(amount);
            assert_eq!(selected.balance(), amount);
            assert_eq!(selected.balance() + remainder.balance(), total);
        }
    }

    #[test]
    fn split_exact_total_leaves_empty_remainder() {
        let wallet = FiatWallet::from_pegs(vec![peg(1, 30, addr(1)), peg(2, 70, addr(1))]);
        let (selected, remainder) = wallet.split_by_amount(100);
        assert_eq!(selected.balance(), 100);
        assert!(remainder.is_empty());
    }

    #[test]
    fn split_zero_selects_nothing() {
        let wallet = FiatWallet::from_pegs(vec![peg(1, 10, addr(1))]);
        let (selected, remainder) = wallet.split_by_amount(0);
        assert!(selected.is_empty());
        assert_eq!(remainder.balance(), 10);
    }

    // --- greedy redemption ---

    #[test]
    fn redeem_walks_in_presented_order_without_sorting() {
        // Largest first on purpose: the walk must consume 40 whole, then
        // split 10. An implicit ascending sort would split 40 instead.
        let wallet = FiatWallet::from_pegs(vec![peg(3, 40, addr(1)), peg(1, 10, addr(1))]);
        let (emptied, redeemer_share) = wallet.redeem_by_amount(45);

        assert_eq!(emptied.len(), 1);
        assert_eq!(emptied.pegs()[0].peg_hash, PegHash::from_index(3));
        // Consumed-whole fragments come back untouched.
        assert_eq!(emptied.pegs()[0].transaction_amount, 40);
        assert_eq!(emptied.pegs()[0].redeemed_amount, 0);

        assert_eq!(redeemer_share.len(), 1);
        let stamped = &redeemer_share.pegs()[0];
        assert_eq!(stamped.peg_hash, PegHash::from_index(1));
        assert_eq!(stamped.transaction_amount, 5);
        assert_eq!(stamped.redeemed_amount, 5);
    }

    #[test]
    fn redeem_passes_untouched_fragments_to_redeemer_share() {
        let wallet = FiatWallet::from_pegs(vec![
            peg(1, 10, addr(1)),
            peg(2, 20, addr(1)),
            peg(3, 30, addr(1)),
        ]);
        let (emptied, redeemer_share) = wallet.redeem_by_amount(10);
        assert_eq!(emptied.len(), 1);
        assert_eq!(redeemer_share.len(), 2);
        assert_eq!(redeemer_share.balance(), 50);
    }

    #[test]
    fn redeem_beyond_total_returns_two_empty_wallets() {
        let wallet = FiatWallet::from_pegs(vec![peg(1, 10, addr(1))]);
        let (emptied, redeemer_share) = wallet.redeem_by_amount(11);
        assert!(emptied.is_empty());
        assert!(redeemer_share.is_empty());
    }

    // --- merge and subtract ---

    #[test]
    fn merge_adds_balances_and_incoming_attributes_win() {
        let mut wallet = FiatWallet::from_pegs(vec![peg(1, 100, addr(1))]);
        let mut incoming_peg = peg(1, 40, addr(2));
        incoming_peg.transaction_id = "FRESH01".to_string();
        wallet.merge_into(FiatWallet::from_pegs(vec![incoming_peg]));

        assert_eq!(wallet.len(), 1);
        assert_eq!(wallet.pegs()[0].transaction_amount, 140);
        assert_eq!(wallet.pegs()[0].transaction_id, "FRESH01");
    }

    #[test]
    fn merge_appends_unknown_hashes_and_sorts_by_hash() {
        let mut wallet = FiatWallet::from_pegs(vec![peg(2, 5, addr(1))]);
        wallet.merge_into(FiatWallet::from_pegs(vec![peg(3, 1, addr(1)), peg(1, 9, addr(1))]));

        let hashes: Vec<_> = wallet.pegs().iter().map(|p| p.peg_hash.clone()).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);
        assert_eq!(wallet.balance(), 15);
    }

    #[test]
    fn subtract_wallet_removes_first_match_per_hash() {
        let mut wallet = FiatWallet::from_pegs(vec![
            peg(1, 10, addr(1)),
            peg(2, 20, addr(1)),
            peg(3, 30, addr(1)),
        ]);
        wallet.subtract_wallet(&FiatWallet::from_pegs(vec![peg(2, 999, addr(9))]));
        assert_eq!(wallet.len(), 2);
        assert!(wallet.pegs().iter().all(|p| p.peg_hash != PegHash::from_index(2)));
    }

    // --- owner-share transfer ---

    #[test]
    fn transfer_moves_share_between_entries() {
        let stored = vec![peg(1, 100, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![peg(1, 60, addr(1))]);

        let updated = transfer_owner_share(&fragments, stored, &addr(1), &addr(2)).unwrap();
        let owners = &updated[0].owners;
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[0].address, addr(1));
        assert_eq!(owners[0].amount, 40);
        assert_eq!(owners[1].address, addr(2));
        assert_eq!(owners[1].amount, 60);
    }

    #[test]
    fn transfer_tops_up_existing_recipient_entry() {
        let mut record = peg(1, 100, addr(1));
        record.owners = vec![
            FiatOwner { address: addr(1), amount: 70 },
            FiatOwner { address: addr(2), amount: 30 },
        ];
        let fragments = FiatWallet::from_pegs(vec![peg(1, 20, addr(1))]);

        let updated = transfer_owner_share(&fragments, vec![record], &addr(1), &addr(2)).unwrap();
        assert_eq!(updated[0].owners[0].amount, 50);
        assert_eq!(updated[0].owners[1].amount, 50);
    }

    #[test]
    fn transfer_drained_entry_stays_at_zero() {
        let stored = vec![peg(1, 100, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![peg(1, 100, addr(1))]);

        let updated = transfer_owner_share(&fragments, stored, &addr(1), &addr(2)).unwrap();
        let owners = &updated[0].owners;
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[0].amount, 0);
        assert_eq!(owners[1].amount, 100);
    }

    #[test]
    fn transfer_conserves_owner_sums() {
        let mut record = peg(1, 100, addr(1));
        record.owners = vec![
            FiatOwner { address: addr(1), amount: 55 },
            FiatOwner { address: addr(3), amount: 45 },
        ];
        let before = owner_sum(&record);
        let fragments = FiatWallet::from_pegs(vec![peg(1, 25, addr(1))]);

        let updated = transfer_owner_share(&fragments, vec![record], &addr(1), &addr(2)).unwrap();
        assert_eq!(owner_sum(&updated[0]), before);
    }

    #[test]
    fn transfer_fails_on_insufficient_holder_balance() {
        let stored = vec![peg(1, 100, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![peg(1, 101, addr(1))]);

        let err = transfer_owner_share(&fragments, stored, &addr(1), &addr(2)).unwrap_err();
        assert_eq!(err, FiatWalletError::MalformedTransfer(PegHash::from_index(1)));
    }

    #[test]
    fn transfer_fails_when_sender_holds_no_entry() {
        let stored = vec![peg(1, 100, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![peg(1, 10, addr(1))]);

        let err = transfer_owner_share(&fragments, stored, &addr(9), &addr(2)).unwrap_err();
        assert_eq!(err, FiatWalletError::MalformedTransfer(PegHash::from_index(1)));
    }

    #[test]
    fn transfer_fails_on_unmatched_fragment() {
        let stored = vec![peg(1, 100, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![peg(2, 10, addr(1))]);

        let err = transfer_owner_share(&fragments, stored, &addr(1), &addr(2)).unwrap_err();
        assert_eq!(err, FiatWalletError::UnmatchedFragment(PegHash::from_index(2)));
    }

    #[test]
    fn multi_fragment_transfer_is_all_or_nothing() {
        let stored = vec![peg(1, 100, addr(1)), peg(2, 5, addr(1))];
        let fragments = FiatWallet::from_pegs(vec![
            peg(1, 50, addr(1)),
            peg(2, 50, addr(1)), // over the second record's balance
        ]);

        assert!(transfer_owner_share(&fragments, stored, &addr(1), &addr(2)).is_err());
    }

    // --- owner-share redemption ---

    #[test]
    fn redeem_share_decrements_and_stamps_record() {
        let stored = vec![peg(1, 100, addr(1))];
        let mut fragment = peg(1, 100, addr(1));
        fragment.redeemed_amount = 30;
        let fragments = FiatWallet::from_pegs(vec![fragment]);

        let updated = redeem_owner_share(&fragments, stored, &addr(1)).unwrap();
        assert_eq!(updated[0].owners.len(), 1);
        assert_eq!(updated[0].owners[0].amount, 70);
        assert_eq!(updated[0].transaction_amount, 70);
        assert_eq!(updated[0].redeemed_amount, 30);
    }

    #[test]
    fn redeem_share_of_exact_balance_removes_entry() {
        let mut record = peg(1, 130, addr(1));
        record.owners = vec![
            FiatOwner { address: addr(1), amount: 100 },
            FiatOwner { address: addr(2), amount: 30 },
        ];
        let mut fragment = peg(1, 100, addr(1));
        fragment.redeemed_amount = 100;
        let fragments = FiatWallet::from_pegs(vec![fragment]);

        let updated = redeem_owner_share(&fragments, vec![record], &addr(1)).unwrap();
        assert_eq!(updated[0].owners.len(), 1);
        assert_eq!(updated[0].owners[0].address, addr(2));
        assert_eq!(updated[0].transaction_amount, 30);
        assert_eq!(updated[0].redeemed_amount, 100);
    }

    #[test]
    fn redeem_share_beyond_balance_fails() {
        let stored = vec![peg(1, 50, addr(1))];
        let mut fragment = peg(1, 50, addr(1));
        fragment.redeemed_amount = 51;
        let fragments = FiatWallet::from_pegs(vec![fragment]);

        let err = redeem_owner_share(&fragments, stored, &addr(1)).unwrap_err();
        assert_eq!(err, FiatWalletError::MalformedTransfer(PegHash::from_index(1)));
    }

    #[test]
    fn redeem_share_fails_on_unmatched_fragment() {
        let stored = vec![peg(1, 50, addr(1))];
        let mut fragment = peg(7, 10, addr(1));
        fragment.redeemed_amount = 10;
        let fragments = FiatWallet::from_pegs(vec![fragment]);

        let err = redeem_owner_share(&fragments, stored, &addr(1)).unwrap_err();
        assert_eq!(err, FiatWalletError::UnmatchedFragment(PegHash::from_index(7)));
    }
}
