//! # KEEL Order & Negotiation Gateway
//!
//! Off-ledger machinery for getting two parties from "maybe" to a settled
//! trade the ledger can execute:
//!
//! - **Negotiation** — a two-party bid agreement machine. Buyer and seller
//!   converge on one price, confirm it independently, and the settled
//!   record hands out the exact payer/payee/peg-hash triples the ledger's
//!   order operations expect.
//! - **Order Book** — per-negotiation custody mirrors. Each order tracks
//!   the asset and fiat wallets deposited against a trade plus the
//!   settlement document hashes (fiat receipt, air waybill) that close it
//!   out.
//!
//! ## Design Principles
//!
//! 1. Everything here is advisory bookkeeping: the ledger's escrow
//!    addresses remain the source of truth for custody, and these records
//!    must be reconstructible from ledger events alone.
//! 2. State is explicit. A negotiation's standing is derived from which
//!    confirmations exist, never from a flag somebody forgot to flip.
//! 3. Identifiers are deterministic: a negotiation id is the byte
//!    concatenation of buyer, seller and peg hash, so both parties compute
//!    the same id without coordinating.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod negotiation;
pub mod order_book;
