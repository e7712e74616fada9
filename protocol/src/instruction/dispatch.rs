//! Batch dispatch: in-order execution with first-error-aborts semantics.
//!
//! The dispatcher applies each instruction against the store it is given
//! and concatenates the audit events. It never commits: run it against a
//! `TxContext` and let the outcome decide between `commit` and `discard`.
//! A failed batch therefore reports exactly which instruction broke and
//! leaves the base store untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::Event;
use crate::factory::{asset, fiat, LedgerError};
use crate::store::PegStore;

use super::types::{Instruction, InstructionBatch};

/// Outcome of a fully applied batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Content hash of the batch, for correlating logs and subscriptions.
    pub batch_id: String,
    /// How many instructions ran. Always the whole batch on success.
    pub instructions_applied: usize,
    /// Audit events of every instruction, in execution order.
    pub events: Vec<Event>,
}

/// A batch that stopped at its first failing instruction.
#[derive(Debug, Error)]
#[error("instruction {index} failed: {source}")]
pub struct BatchError {
    /// Zero-based position of the failing instruction.
    pub index: usize,
    /// The failure, verbatim from the factory.
    pub source: LedgerError,
}

/// Runs every instruction of `batch` against `store`, in order.
///
/// On the first failure the remaining instructions are skipped and no
/// events are surfaced; the caller is expected to discard the context.
pub fn dispatch<S: PegStore>(
    store: &mut S,
    batch: &InstructionBatch,
) -> Result<BatchReceipt, BatchError> {
    let batch_id = batch.batch_id();
    let mut events = Vec::new();

    for (index, instruction) in batch.instructions.iter().enumerate() {
        debug!(batch = %batch_id, index, kind = instruction.kind(), "applying instruction");
        match apply(store, instruction) {
            Ok(mut produced) => events.append(&mut produced),
            Err(source) => {
                warn!(
                    batch = %batch_id,
                    index,
                    kind = instruction.kind(),
                    error = %source,
                    "batch aborted"
                );
                return Err(BatchError { index, source });
            }
        }
    }

    info!(
        batch = %batch_id,
        instructions = batch.len(),
        events = events.len(),
        "batch applied"
    );
    Ok(BatchReceipt {
        batch_id,
        instructions_applied: batch.len(),
        events,
    })
}

fn apply<S: PegStore>(store: &mut S, instruction: &Instruction) -> Result<Vec<Event>, LedgerError> {
    match instruction {
        Instruction::IssueAsset {
            issuer,
            recipient,
            peg,
        } => asset::issue(store, issuer, recipient, peg.clone()),
        Instruction::RedeemAsset {
            owner,
            recipient,
            peg_hash,
        } => asset::redeem(store, owner, recipient, peg_hash),
        Instruction::SendAsset { from, to, peg_hash } => {
            asset::send_to_order(store, from, to, peg_hash)
        }
        Instruction::ExecuteAsset { from, to, peg_hash } => {
            asset::execute_order(store, from, to, peg_hash)
        }
        Instruction::IssueFiat {
            issuer,
            recipient,
            peg,
        } => fiat::issue(store, issuer, recipient, peg.clone()),
        Instruction::RedeemFiat { redeemer, wallet } => fiat::redeem(store, redeemer, wallet),
        Instruction::SendFiat {
            from,
            to,
            peg_hash,
            wallet,
        } => fiat::send_to_order(store, from, to, peg_hash, wallet),
        Instruction::ExecuteFiat {
            from,
            to,
            peg_hash,
            wallet,
        } => fiat::execute_order(store, from, to, peg_hash, wallet),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
