//! # Order Book
//!
//! Per-negotiation custody mirrors. While the ledger's escrow addresses
//! hold the actual value, an [`Order`] tracks what has been deposited
//! against a trade and which settlement documents have arrived:
//!
//! 1. **Deposit** — the asset leg and fiat fragments are filed under the
//!    negotiation id as the parties escrow them. The first deposit creates
//!    the order.
//! 2. **Prove** — the fiat receipt hash and the air waybill hash are
//!    recorded once each; a proof never changes after it lands.
//! 3. **Withdraw** — settlement drains the wallets back out, the fiat side
//!    through the same greedy selection the ledger uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use keel_protocol::types::{AssetPeg, AssetWallet, FiatWallet, PegHash};

use crate::negotiation::NegotiationId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during order book operations.
#[derive(Debug, Error)]
pub enum OrderBookError {
    /// No order exists under this negotiation id.
    #[error("order {0} not found")]
    OrderNotFound(NegotiationId),

    /// The order does not hold an asset peg with this hash.
    #[error("order holds no asset peg {0}")]
    AssetNotHeld(PegHash),

    /// The order's fiat wallet cannot cover the requested amount.
    #[error("insufficient funds in order: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount the withdrawal asked for.
        needed: i64,
        /// Amount the order's fiat wallet holds.
        available: i64,
    },

    /// The proof hash was already recorded; proofs are write-once.
    #[error("{kind} proof already set for this order")]
    ProofAlreadySet {
        /// Which proof was being set.
        kind: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Custody record for one negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// The negotiation this order settles.
    pub negotiation_id: NegotiationId,
    /// Asset pegs deposited against the trade.
    pub asset_wallet: AssetWallet,
    /// Fiat fragments deposited against the trade.
    pub fiat_wallet: FiatWallet,
    /// Hash of the fiat payment receipt, once presented.
    pub fiat_proof_hash: Option<String>,
    /// Hash of the air waybill, once presented.
    pub awb_proof_hash: Option<String>,
    /// Timestamp when the order was opened by its first deposit.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent change.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    fn new(negotiation_id: NegotiationId) -> Self {
        let now = Utc::now();
        Self {
            negotiation_id,
            asset_wallet: AssetWallet::new(),
            fiat_wallet: FiatWallet::new(),
            fiat_proof_hash: None,
            awb_proof_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// OrderBook
// ---------------------------------------------------------------------------

/// Process-local collection of orders, keyed by negotiation id.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: HashMap<NegotiationId, Order>,
}

impl OrderBook {
    /// An empty book.
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Number of open orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when no orders are open.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// A snapshot of the order under `id`.
    pub fn get(&self, id: &NegotiationId) -> Result<Order, OrderBookError> {
        self.orders
            .get(id)
            .cloned()
            .ok_or_else(|| OrderBookError::OrderNotFound(id.clone()))
    }

    /// Files an asset peg under the order, creating the order if this is
    /// its first deposit. Returns `false` when the order already holds a
    /// peg with the same hash, in which case nothing changes.
    pub fn deposit_asset(&mut self, id: &NegotiationId, peg: AssetPeg) -> bool {
        let order = self.open(id);
        let added = order.asset_wallet.add(peg);
        if added {
            order.updated_at = Utc::now();
        }
        added
    }

    /// Merges fiat fragments into the order's wallet, creating the order
    /// if this is its first deposit. Fragments naming the same peg add
    /// their balances.
    pub fn deposit_fiat(&mut self, id: &NegotiationId, wallet: FiatWallet) {
        let order = self.open(id);
        order.fiat_wallet.merge_into(wallet);
        order.updated_at = Utc::now();
    }

    /// Removes and returns the asset peg with the given hash.
    ///
    /// # Errors
    ///
    /// Returns [`OrderBookError::OrderNotFound`] for an unknown order and
    /// [`OrderBookError::AssetNotHeld`] when the hash is not in its wallet.
    pub fn withdraw_asset(
        &mut self,
        id: &NegotiationId,
        peg_hash: &PegHash,
    ) -> Result<AssetPeg, OrderBookError> {
        let order = self.get_mut(id)?;
        let peg = order
            .asset_wallet
            .subtract(peg_hash)
            .ok_or_else(|| OrderBookError::AssetNotHeld(peg_hash.clone()))?;
        order.updated_at = Utc::now();
        Ok(peg)
    }

    /// Selects `amount` out of the order's fiat wallet and returns it,
    /// leaving the remainder in the order. Selection is the same greedy
    /// split the ledger's wallets use, so a crossing fragment is divided.
    ///
    /// # Errors
    ///
    /// Returns [`OrderBookError::OrderNotFound`] for an unknown order and
    /// [`OrderBookError::InsufficientFunds`] when the wallet cannot cover
    /// `amount`; the wallet is left untouched in that case.
    pub fn withdraw_fiat(
        &mut self,
        id: &NegotiationId,
        amount: i64,
    ) -> Result<FiatWallet, OrderBookError> {
        let order = self.get_mut(id)?;
        let available = order.fiat_wallet.balance();
        if amount > available {
            return Err(OrderBookError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        let held = std::mem::take(&mut order.fiat_wallet);
        let (selected, remainder) = held.split_by_amount(amount);
        order.fiat_wallet = remainder;
        order.updated_at = Utc::now();
        Ok(selected)
    }

    /// Records the fiat payment receipt hash.
    ///
    /// # Errors
    ///
    /// Returns [`OrderBookError::OrderNotFound`] for an unknown order and
    /// [`OrderBookError::ProofAlreadySet`] on a second write.
    pub fn set_fiat_proof(
        &mut self,
        id: &NegotiationId,
        proof_hash: String,
    ) -> Result<(), OrderBookError> {
        let order = self.get_mut(id)?;
        if order.fiat_proof_hash.is_some() {
            return Err(OrderBookError::ProofAlreadySet { kind: "fiat" });
        }
        order.fiat_proof_hash = Some(proof_hash);
        order.updated_at = Utc::now();
        Ok(())
    }

    /// Records the air waybill hash. Same contract as
    /// [`set_fiat_proof`](Self::set_fiat_proof).
    pub fn set_awb_proof(
        &mut self,
        id: &NegotiationId,
        proof_hash: String,
    ) -> Result<(), OrderBookError> {
        let order = self.get_mut(id)?;
        if order.awb_proof_hash.is_some() {
            return Err(OrderBookError::ProofAlreadySet { kind: "awb" });
        }
        order.awb_proof_hash = Some(proof_hash);
        order.updated_at = Utc::now();
        Ok(())
    }

    fn open(&mut self, id: &NegotiationId) -> &mut Order {
        self.orders
            .entry(id.clone())
            .or_insert_with(|| Order::new(id.clone()))
    }

    fn get_mut(&mut self, id: &NegotiationId) -> Result<&mut Order, OrderBookError> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| OrderBookError::OrderNotFound(id.clone()))
    }
}
