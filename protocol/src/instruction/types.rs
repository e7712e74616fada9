//! Instruction and batch types.
//!
//! One `Instruction` names one elementary ledger operation with every
//! field it needs; the enum replaces a runtime type switch with
//! compile-time checked payloads. A batch is an ordered list of
//! instructions that stands or falls as one unit.

use serde::{Deserialize, Serialize};

use crate::types::{Address, AssetPeg, FiatPeg, FiatWallet, PegHash};

/// One elementary ledger operation.
///
/// The JSON form carries the kind in a `type` tag, matching the audit
/// event encoding, so request and response streams read alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Fill a reserved asset hash with live issuance data.
    IssueAsset {
        issuer: Address,
        recipient: Address,
        peg: AssetPeg,
    },
    /// Retire an asset peg back to a placeholder held by `recipient`.
    RedeemAsset {
        owner: Address,
        recipient: Address,
        peg_hash: PegHash,
    },
    /// Lock an asset peg into the escrow of an order between `from` and `to`.
    SendAsset {
        from: Address,
        to: Address,
        peg_hash: PegHash,
    },
    /// Release an escrowed asset peg to `to`.
    ExecuteAsset {
        from: Address,
        to: Address,
        peg_hash: PegHash,
    },
    /// Fill a reserved fiat hash, crediting `recipient` with the amount.
    IssueFiat {
        issuer: Address,
        recipient: Address,
        peg: FiatPeg,
    },
    /// Permanently retire fiat shares held by `redeemer`.
    RedeemFiat {
        redeemer: Address,
        wallet: FiatWallet,
    },
    /// Escrow fiat shares into an order. `peg_hash` names the order.
    SendFiat {
        from: Address,
        to: Address,
        peg_hash: PegHash,
        wallet: FiatWallet,
    },
    /// Settle escrowed fiat shares out of an order, returning any
    /// residual escrow balance to `from`.
    ExecuteFiat {
        from: Address,
        to: Address,
        peg_hash: PegHash,
        wallet: FiatWallet,
    },
}

impl Instruction {
    /// Stable name of the instruction kind, matching the JSON tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::IssueAsset { .. } => "issue_asset",
            Instruction::RedeemAsset { .. } => "redeem_asset",
            Instruction::SendAsset { .. } => "send_asset",
            Instruction::ExecuteAsset { .. } => "execute_asset",
            Instruction::IssueFiat { .. } => "issue_fiat",
            Instruction::RedeemFiat { .. } => "redeem_fiat",
            Instruction::SendFiat { .. } => "send_fiat",
            Instruction::ExecuteFiat { .. } => "execute_fiat",
        }
    }
}

/// An ordered list of instructions applied as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionBatch {
    pub instructions: Vec<Instruction>,
}

impl InstructionBatch {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions in the batch.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when the batch carries no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Content hash of the batch, hex-rendered. Two batches with the
    /// same instructions in the same order share an id; any change to
    /// payload or order produces a new one.
    pub fn batch_id(&self) -> String {
        let bytes =
            bincode::serialize(&self.instructions).expect("instruction encoding never fails");
        blake3::hash(&bytes).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
