//! # Peg Data Types
//!
//! The value vocabulary of the KEEL ledger. Everything stored or moved by
//! the factories is built from these types.
//!
//! ## Architecture
//!
//! ```text
//! peg_hash.rs — PegHash identifier newtype (hex display, byte-wise order)
//! address.rs  — Address newtype (bech32 accounts, hex escrow pseudo-accounts)
//! asset.rs    — AssetPeg records and hash-ordered AssetWallet
//! fiat.rs     — FiatPeg records, owner shares, and the FiatWallet algebra
//! ```
//!
//! ## Design Decisions
//!
//! - All peg types are plain owned values. Nothing mutates a stored record
//!   in place: an operation loads a snapshot, builds a replacement, and
//!   persists it under the same hash.
//! - Monetary fields are `i64` in the smallest denomination. No floating
//!   point anywhere near monetary values.
//! - Fiat wallets carry two incompatible orderings. Sorting is therefore
//!   always an explicit, named call (`sort_by_peg_hash` for matching,
//!   `sort_by_ascending_balance` for greedy selection) and never implied
//!   by the container.

pub mod address;
pub mod asset;
pub mod fiat;
pub mod peg_hash;

pub use address::{Address, AddressError};
pub use asset::{AssetPeg, AssetWallet};
pub use fiat::{FiatOwner, FiatPeg, FiatWallet, FiatWalletError};
pub use peg_hash::{PegHash, PegHashError};

use thiserror::Error;

/// Violation of an issuance field rule.
///
/// Produced by the `validate` methods on [`AssetPeg`] and [`FiatPeg`]
/// before a record is allowed into the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct FieldViolation {
    /// Which field failed, in the record's JSON spelling.
    pub field: &'static str,
    /// What the rule expected.
    pub reason: String,
}
