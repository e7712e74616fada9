//! # Instructions
//!
//! The message surface of the ledger: callers describe what should happen
//! as a batch of typed instructions, and the dispatcher turns that into
//! factory calls against a store.
//!
//! ## Architecture
//!
//! ```text
//! types.rs    — Instruction enum, InstructionBatch, content-hash ids
//! dispatch.rs — in-order execution, BatchReceipt / BatchError
//! ```
//!
//! Atomicity is deliberately not handled here. The dispatcher mutates
//! whatever store it is given; hosts wrap the base store in a
//! [`TxContext`](crate::store::TxContext) and commit or discard after
//! looking at the result. That keeps dispatch testable against a bare
//! `MemStore` and keeps the commit decision in exactly one place.

pub mod dispatch;
pub mod types;

pub use dispatch::{dispatch, BatchError, BatchReceipt};
pub use types::{Instruction, InstructionBatch};
