//! Escrow pseudo-account derivation.
//!
//! While a peg sits in an order it is owned by an address nobody holds keys
//! for: the deterministic concatenation of the two parties and the peg
//! hash. Locking writes this address as the owner; release recomputes it
//! from the same triple and compares raw bytes. No lock table, no orphaned
//! locks, and anyone knowing the triple can verify escrow state.
//!
//! The byte layout is a protocol invariant. Lock and release must derive
//! identically or escrowed pegs become unreleasable, so every call site
//! goes through this one function.

use crate::types::{Address, PegHash};

/// Derives the pseudo-account holding a peg for the order
/// `(payer, payee, peg_hash)`.
///
/// Layout: payee bytes, then payer bytes, then the peg hash bytes.
pub fn escrow_address(payer: &Address, payee: &Address, peg_hash: &PegHash) -> Address {
    let mut bytes = Vec::with_capacity(payee.len() + payer.len() + peg_hash.len());
    bytes.extend_from_slice(payee.as_bytes());
    bytes.extend_from_slice(payer.as_bytes());
    bytes.extend_from_slice(peg_hash.as_bytes());
    Address::from_raw(bytes)
}
