//! # Audit Events
//!
//! Every successful ledger operation appends one or more events naming the
//! parties and the peg involved. Events are an append-only audit record:
//! the ledger writes them and never reads them back, hosts forward them to
//! subscribers and logs.
//!
//! ## Design Decisions
//!
//! - **Display form, not raw bytes.** Event fields are strings in the same
//!   form the API renders: bech32 for account addresses, hex for escrow
//!   pseudo-addresses and peg hashes. An event is a record for humans and
//!   downstream indexers, not an input to further ledger logic.
//! - **Tagged JSON.** The `type` tag keeps the WebSocket stream
//!   self-describing without a wrapper struct per event kind.

use serde::{Deserialize, Serialize};

use crate::types::{Address, PegHash};

/// One audit record emitted by a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An asset peg left the issuer's pool and became a live tokenized asset.
    AssetIssued {
        recipient: String,
        issuer: String,
        peg_hash: String,
    },
    /// An asset peg moved from its owner into an order's escrow.
    AssetSent {
        recipient: String,
        sender: String,
        peg_hash: String,
    },
    /// An escrowed asset peg settled to the order's counterparty.
    AssetExecuted {
        recipient: String,
        sender: String,
        peg_hash: String,
    },
    /// An asset peg was retired back to a placeholder.
    AssetRedeemed {
        recipient: String,
        last_owner: String,
        peg_hash: String,
    },
    /// A fiat peg was brought to life against a deposit.
    FiatIssued {
        recipient: String,
        issuer: String,
        peg_hash: String,
    },
    /// Fiat value moved from a holder into an order's escrow.
    FiatSent {
        recipient: String,
        sender: String,
        peg_hash: String,
    },
    /// Escrowed fiat value settled out of an order. Emitted once per inner
    /// settlement transfer, so one execute may produce several.
    FiatExecuted {
        recipient: String,
        sender: String,
        peg_hash: String,
    },
    /// A holder permanently retired part of their fiat claim.
    FiatRedeemed { redeemer: String },
}

impl Event {
    pub fn asset_issued(recipient: &Address, issuer: &Address, peg_hash: &PegHash) -> Self {
        Event::AssetIssued {
            recipient: recipient.to_string(),
            issuer: issuer.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn asset_sent(recipient: &Address, sender: &Address, peg_hash: &PegHash) -> Self {
        Event::AssetSent {
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn asset_executed(recipient: &Address, sender: &Address, peg_hash: &PegHash) -> Self {
        Event::AssetExecuted {
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn asset_redeemed(recipient: &Address, last_owner: &Address, peg_hash: &PegHash) -> Self {
        Event::AssetRedeemed {
            recipient: recipient.to_string(),
            last_owner: last_owner.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn fiat_issued(recipient: &Address, issuer: &Address, peg_hash: &PegHash) -> Self {
        Event::FiatIssued {
            recipient: recipient.to_string(),
            issuer: issuer.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn fiat_sent(recipient: &Address, sender: &Address, peg_hash: &PegHash) -> Self {
        Event::FiatSent {
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn fiat_executed(recipient: &Address, sender: &Address, peg_hash: &PegHash) -> Self {
        Event::FiatExecuted {
            recipient: recipient.to_string(),
            sender: sender.to_string(),
            peg_hash: peg_hash.to_string(),
        }
    }

    pub fn fiat_redeemed(redeemer: &Address) -> Self {
        Event::FiatRedeemed {
            redeemer: redeemer.to_string(),
        }
    }

    /// Stable name of the event kind, as used in the JSON tag and in
    /// metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AssetIssued { .. } => "asset_issued",
            Event::AssetSent { .. } => "asset_sent",
            Event::AssetExecuted { .. } => "asset_executed",
            Event::AssetRedeemed { .. } => "asset_redeemed",
            Event::FiatIssued { .. } => "fiat_issued",
            Event::FiatSent { .. } => "fiat_sent",
            Event::FiatExecuted { .. } => "fiat_executed",
            Event::FiatRedeemed { .. } => "fiat_redeemed",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::escrow_address;

    fn account(tag: u8) -> Address {
        Address::from_raw(vec![tag; 20])
    }

    #[test]
    fn json_carries_the_kind_as_a_type_tag() {
        let event = Event::asset_issued(&account(1), &account(2), &PegHash::from_index(7));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"asset_issued\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn kind_matches_the_serde_tag_for_every_variant() {
        let hash = PegHash::from_index(1);
        let a = account(1);
        let events = vec![
            Event::asset_issued(&a, &a, &hash),
            Event::asset_sent(&a, &a, &hash),
            Event::asset_executed(&a, &a, &hash),
            Event::asset_redeemed(&a, &a, &hash),
            Event::fiat_issued(&a, &a, &hash),
            Event::fiat_sent(&a, &a, &hash),
            Event::fiat_executed(&a, &a, &hash),
            Event::fiat_redeemed(&a),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }

    #[test]
    fn account_parties_render_as_bech32_and_escrow_as_hex() {
        let buyer = account(0xaa);
        let seller = account(0xbb);
        let hash = PegHash::from_index(3);
        let escrow = escrow_address(&seller, &buyer, &hash);

        let event = Event::fiat_sent(&escrow, &seller, &hash);
        match event {
            Event::FiatSent {
                recipient, sender, ..
            } => {
                assert!(sender.starts_with("keel1"));
                assert!(!recipient.starts_with("keel1"));
                assert!(recipient.chars().all(|c| c.is_ascii_hexdigit()));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn redeem_event_names_only_the_redeemer() {
        let event = Event::fiat_redeemed(&account(5));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "fiat_redeemed");
        assert!(json.get("peg_hash").is_none());
    }
}
