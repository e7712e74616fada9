//! # Bid Negotiation
//!
//! Implements the two-party agreement that precedes every trade. The
//! lifecycle is:
//!
//! 1. **Propose** — either party records a bid for a peg between a buyer
//!    and a seller. Re-proposing updates the bid and wipes any one-sided
//!    confirmation, so nobody can be held to a price they never saw.
//! 2. **Confirm** — buyer and seller each confirm independently. A
//!    confirmation must quote the recorded bid exactly.
//! 3. **Settled** — both confirmations present. The record is frozen and
//!    hands out the payer/payee/peg-hash triples that drive the ledger's
//!    order operations: the asset flows seller to buyer, the money flows
//!    buyer to seller.
//!
//! Identity is deterministic: a negotiation id is the byte concatenation
//! of buyer address, seller address and peg hash, so both parties derive
//! the same id with no round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use keel_protocol::types::{Address, PegHash};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during negotiation operations.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// No negotiation exists under this id.
    #[error("negotiation {0} not found")]
    NotFound(NegotiationId),

    /// A confirmation quoted a different bid than the one on record.
    #[error("confirming bid {offered} does not match recorded bid {recorded}")]
    BidMismatch {
        /// The bid the confirming party quoted.
        offered: i64,
        /// The bid currently on record.
        recorded: i64,
    },

    /// Both sides have already confirmed; the record is frozen.
    #[error("negotiation is already settled")]
    AlreadySettled,

    /// The settlement triples are only available once both sides confirm.
    #[error("negotiation is not settled yet: {status}")]
    NotSettled {
        /// Where the negotiation currently stands.
        status: NegotiationStatus,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Deterministic identity of one negotiation:
/// `buyer.bytes ++ seller.bytes ++ peg_hash.bytes`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NegotiationId(Vec<u8>);

impl NegotiationId {
    /// Derives the id for a buyer/seller/peg triple.
    pub fn derive(buyer: &Address, seller: &Address, peg_hash: &PegHash) -> Self {
        let mut bytes = Vec::with_capacity(buyer.len() + seller.len() + peg_hash.len());
        bytes.extend_from_slice(buyer.as_bytes());
        bytes.extend_from_slice(seller.as_bytes());
        bytes.extend_from_slice(peg_hash.as_bytes());
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NegotiationId({})", self)
    }
}

impl Serialize for NegotiationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for NegotiationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(&s)
                .map(NegotiationId)
                .map_err(serde::de::Error::custom)
        } else {
            Ok(NegotiationId(<Vec<u8>>::deserialize(deserializer)?))
        }
    }
}

/// Where a negotiation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationStatus {
    /// A bid is on record, neither side has confirmed.
    Proposed,
    /// Only the buyer has confirmed the recorded bid.
    BuyerConfirmed,
    /// Only the seller has confirmed the recorded bid.
    SellerConfirmed,
    /// Both sides confirmed — the record is frozen and settleable.
    Settled,
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationStatus::Proposed => write!(f, "Proposed"),
            NegotiationStatus::BuyerConfirmed => write!(f, "BuyerConfirmed"),
            NegotiationStatus::SellerConfirmed => write!(f, "SellerConfirmed"),
            NegotiationStatus::Settled => write!(f, "Settled"),
        }
    }
}

/// One leg of a settled trade, ready to feed the ledger's order
/// operations as `(from, to, peg_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTriple {
    /// Party the value leaves.
    pub payer: Address,
    /// Party the value reaches.
    pub payee: Address,
    /// The peg under negotiation.
    pub peg_hash: PegHash,
}

/// One two-party bid agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Negotiation {
    /// Deterministic identity, derived from the parties and the peg.
    pub negotiation_id: NegotiationId,
    /// The party paying fiat and receiving the asset.
    pub buyer: Address,
    /// The party shipping the asset and receiving fiat.
    pub seller: Address,
    /// The asset peg under negotiation.
    pub peg_hash: PegHash,
    /// The price on record, in cents.
    pub bid: i64,
    /// Party-supplied validity horizon for the bid.
    pub time: i64,
    /// Sequence number of the buyer's confirmation, if present.
    pub buyer_sequence: Option<u64>,
    /// Sequence number of the seller's confirmation, if present.
    pub seller_sequence: Option<u64>,
    /// Timestamp when the negotiation was first proposed.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent state change.
    pub updated_at: DateTime<Utc>,
}

impl Negotiation {
    fn new(buyer: &Address, seller: &Address, peg_hash: &PegHash, bid: i64, time: i64) -> Self {
        let now = Utc::now();
        Self {
            negotiation_id: NegotiationId::derive(buyer, seller, peg_hash),
            buyer: buyer.clone(),
            seller: seller.clone(),
            peg_hash: peg_hash.clone(),
            bid,
            time,
            buyer_sequence: None,
            seller_sequence: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Standing derived from which confirmations exist.
    pub fn status(&self) -> NegotiationStatus {
        match (self.buyer_sequence, self.seller_sequence) {
            (Some(_), Some(_)) => NegotiationStatus::Settled,
            (Some(_), None) => NegotiationStatus::BuyerConfirmed,
            (None, Some(_)) => NegotiationStatus::SellerConfirmed,
            (None, None) => NegotiationStatus::Proposed,
        }
    }

    /// True once both confirmations are present.
    pub fn is_settled(&self) -> bool {
        self.status() == NegotiationStatus::Settled
    }

    /// The asset leg of the settled trade: seller pays the peg to the buyer.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::NotSettled`] before both sides confirm.
    pub fn asset_triple(&self) -> Result<SettlementTriple, NegotiationError> {
        self.require_settled()?;
        Ok(SettlementTriple {
            payer: self.seller.clone(),
            payee: self.buyer.clone(),
            peg_hash: self.peg_hash.clone(),
        })
    }

    /// The fiat leg of the settled trade: buyer pays money to the seller.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::NotSettled`] before both sides confirm.
    pub fn fiat_triple(&self) -> Result<SettlementTriple, NegotiationError> {
        self.require_settled()?;
        Ok(SettlementTriple {
            payer: self.buyer.clone(),
            payee: self.seller.clone(),
            peg_hash: self.peg_hash.clone(),
        })
    }

    fn require_settled(&self) -> Result<(), NegotiationError> {
        if !self.is_settled() {
            return Err(NegotiationError::NotSettled {
                status: self.status(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NegotiationBook
// ---------------------------------------------------------------------------

/// Which side is confirming.
enum Party {
    Buyer,
    Seller,
}

/// Process-local collection of negotiations, keyed by derived id.
///
/// Confirmations are stamped with a book-wide monotone sequence number,
/// so the order in which parties committed is always reconstructible.
#[derive(Debug, Default)]
pub struct NegotiationBook {
    negotiations: HashMap<NegotiationId, Negotiation>,
    next_sequence: u64,
}

impl NegotiationBook {
    /// An empty book.
    pub fn new() -> Self {
        Self {
            negotiations: HashMap::new(),
            next_sequence: 1,
        }
    }

    /// Number of negotiations on record.
    pub fn len(&self) -> usize {
        self.negotiations.len()
    }

    /// True when no negotiations are on record.
    pub fn is_empty(&self) -> bool {
        self.negotiations.is_empty()
    }

    /// Looks up a negotiation by id.
    pub fn get(&self, id: &NegotiationId) -> Option<&Negotiation> {
        self.negotiations.get(id)
    }

    /// Records or updates the bid between a buyer and a seller for a peg.
    ///
    /// Creating and re-bidding go through the same door: an existing
    /// record gets the new bid and time, and any one-sided confirmation
    /// is wiped so the changed price must be re-confirmed by both.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::AlreadySettled`] once both sides have
    /// confirmed; a settled price cannot move.
    pub fn propose_bid(
        &mut self,
        buyer: &Address,
        seller: &Address,
        peg_hash: &PegHash,
        bid: i64,
        time: i64,
    ) -> Result<NegotiationId, NegotiationError> {
        let id = NegotiationId::derive(buyer, seller, peg_hash);
        match self.negotiations.get_mut(&id) {
            Some(negotiation) => {
                if negotiation.is_settled() {
                    return Err(NegotiationError::AlreadySettled);
                }
                negotiation.bid = bid;
                negotiation.time = time;
                negotiation.buyer_sequence = None;
                negotiation.seller_sequence = None;
                negotiation.updated_at = Utc::now();
            }
            None => {
                self.negotiations
                    .insert(id.clone(), Negotiation::new(buyer, seller, peg_hash, bid, time));
            }
        }
        Ok(id)
    }

    /// The buyer confirms the recorded bid.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::NotFound`] for an unknown id,
    /// [`NegotiationError::BidMismatch`] when `bid` differs from the
    /// record, and [`NegotiationError::AlreadySettled`] once both sides
    /// have confirmed.
    pub fn confirm_buyer(
        &mut self,
        id: &NegotiationId,
        bid: i64,
        time: i64,
    ) -> Result<NegotiationStatus, NegotiationError> {
        self.confirm(id, bid, time, Party::Buyer)
    }

    /// The seller confirms the recorded bid. Same contract as
    /// [`confirm_buyer`](Self::confirm_buyer).
    pub fn confirm_seller(
        &mut self,
        id: &NegotiationId,
        bid: i64,
        time: i64,
    ) -> Result<NegotiationStatus, NegotiationError> {
        self.confirm(id, bid, time, Party::Seller)
    }

    /// Where the negotiation under `id` currently stands.
    pub fn status(&self, id: &NegotiationId) -> Result<NegotiationStatus, NegotiationError> {
        self.negotiations
            .get(id)
            .map(Negotiation::status)
            .ok_or_else(|| NegotiationError::NotFound(id.clone()))
    }

    /// The asset leg of a settled negotiation. See [`Negotiation::asset_triple`].
    pub fn asset_triple(&self, id: &NegotiationId) -> Result<SettlementTriple, NegotiationError> {
        self.negotiations
            .get(id)
            .ok_or_else(|| NegotiationError::NotFound(id.clone()))?
            .asset_triple()
    }

    /// The fiat leg of a settled negotiation. See [`Negotiation::fiat_triple`].
    pub fn fiat_triple(&self, id: &NegotiationId) -> Result<SettlementTriple, NegotiationError> {
        self.negotiations
            .get(id)
            .ok_or_else(|| NegotiationError::NotFound(id.clone()))?
            .fiat_triple()
    }

    fn confirm(
        &mut self,
        id: &NegotiationId,
        bid: i64,
        time: i64,
        party: Party,
    ) -> Result<NegotiationStatus, NegotiationError> {
        let negotiation = self
            .negotiations
            .get_mut(id)
            .ok_or_else(|| NegotiationError::NotFound(id.clone()))?;

        if negotiation.is_settled() {
            return Err(NegotiationError::AlreadySettled);
        }
        if negotiation.bid != bid {
            return Err(NegotiationError::BidMismatch {
                offered: bid,
                recorded: negotiation.bid,
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        match party {
            Party::Buyer => negotiation.buyer_sequence = Some(sequence),
            Party::Seller => negotiation.seller_sequence = Some(sequence),
        }
        negotiation.time = time;
        negotiation.updated_at = Utc::now();

        Ok(negotiation.status())
    }
}
