// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KEEL Protocol — Core Library
//!
//! This is the beating heart of KEEL: a permissioned custody ledger for
//! real-world assets, built for trades that end with a signature on paper
//! and a container on a ship, not for casino tokens.
//!
//! KEEL takes a pragmatic stance: every tokenized asset is a *peg* — a
//! store record tied forever to one hash — and everything the ledger does
//! is a guarded rewrite of peg records. Assets have exactly one owner at a
//! time. Fiat claims are fractional, split across owner lists that must
//! balance to the cent after every operation. Escrow is an address you can
//! recompute, not a table you can corrupt.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! custody ledger:
//!
//! - **types** — Peg records, wallets, and the owner-share algebra.
//! - **escrow** — Deterministic escrow address derivation. No lock table.
//! - **store** — The key-value seam: sled on disk, maps in memory, an
//!   overlay for batches.
//! - **factory** — The lifecycle operations: issue, send, execute, redeem.
//! - **instruction** — Typed instruction batches and first-error dispatch.
//! - **events** — Audit events, one per thing that actually happened.
//! - **config** — Protocol constants and network parameters.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance (but we're still fast).
//! 2. Money is `i64` cents and conservation is checked in tests. Plural.
//! 3. Every operation either fully happens or reports why it didn't.
//! 4. If it touches custody, it has tests. Also plural.

pub mod config;
pub mod escrow;
pub mod events;
pub mod factory;
pub mod instruction;
pub mod store;
pub mod types;
