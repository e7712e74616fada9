//! # Protocol Configuration & Constants
//!
//! Every magic number in KEEL lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the DNA of the ledger. Changing them after the first
//! production deployment is somewhere between "difficult" and
//! "career-ending", so choose wisely during devnet.

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet — the real deal. Mistakes here cost real assets.
pub const NETWORK_ID_MAINNET: u32 = 0x4B45454C; // "KEEL" in ASCII hex. Yes, we're that cute.

/// Testnet — where we break things on purpose and call it "testing."
pub const NETWORK_ID_TESTNET: u32 = 0x4B454C54; // "KELT"

/// Devnet — the wild west. Reset weekly, no promises, no survivors.
pub const NETWORK_ID_DEVNET: u32 = 0x4B454C44; // "KELD"

/// Human-readable network prefixes for account addresses.
/// Bech32 HRP values — short enough to type, long enough to be unambiguous.
pub const MAINNET_HRP: &str = "keel";
pub const TESTNET_HRP: &str = "tkeel";
pub const DEVNET_HRP: &str = "dkeel";

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol magic tag reserved for KEEL on-disk artifacts. Any future
/// file format starts with these 4 bytes so tools can reject foreign
/// data without parsing further.
pub const PROTOCOL_MAGIC: u32 = 0x414C4153; // "ALAS" — A Ledger for Asset Settlement

/// Protocol fingerprint for network identification.
/// Used in status responses and genesis files to uniquely identify the
/// KEEL protocol family and build generation.
pub const PROTOCOL_FINGERPRINT: &str = "ALAS-KEEL-2026";

/// Major version — bump on breaking ledger-semantics changes.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version — bump on non-semantic bug fixes.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Address Parameters
// ---------------------------------------------------------------------------

/// Account address length in bytes. 20 bytes, rendered as bech32.
/// Escrow-derived pseudo-addresses are longer (two accounts plus a peg hash
/// concatenated) and never leave the ledger as bech32.
pub const ACCOUNT_ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Peg Field Limits
// ---------------------------------------------------------------------------

/// Shortest acceptable fiat transaction ID. Two characters is already
/// suspicious, one is a typo.
pub const TRANSACTION_ID_MIN_LENGTH: usize = 2;

/// Longest acceptable fiat transaction ID. Bank references top out well
/// below this; anything longer is someone pasting the wrong field.
pub const TRANSACTION_ID_MAX_LENGTH: usize = 40;

/// Maximum peg hash length in bytes. Genesis hashes are a handful of bytes,
/// externally minted ones are digests — 64 covers both with room to spare.
pub const MAX_PEG_HASH_LENGTH: usize = 64;

/// Maximum number of elementary instructions per submitted batch.
/// Keeps dispatch latency bounded; real settlement batches are tiny.
pub const MAX_BATCH_INSTRUCTIONS: usize = 512;

// ---------------------------------------------------------------------------
// Storage Layout
// ---------------------------------------------------------------------------

/// Key prefix tag for peg records. Every peg key is this tag followed by
/// the raw peg hash bytes, so prefix scans enumerate exactly the pegs.
pub const PEG_KEY_PREFIX: &[u8] = b"PegHash:";

/// Sled tree holding asset peg records.
pub const TREE_ASSET_PEGS: &str = "asset_pegs";

/// Sled tree holding fiat peg records.
pub const TREE_FIAT_PEGS: &str = "fiat_pegs";

/// Sled tree holding node-local metadata (genesis marker and friends).
pub const TREE_META: &str = "meta";

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Default number of placeholder pegs pre-allocated per kind at genesis.
/// Issuance only ever fills a placeholder, so this is the ledger's lifetime
/// capacity until someone runs another allocation.
pub const DEFAULT_GENESIS_PEG_COUNT: u32 = 10_000;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default REST API port.
pub const DEFAULT_API_PORT: u16 = 9750;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9751;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the human-readable prefix for a given network ID.
/// Returns `None` for unrecognized networks — we don't guess.
pub fn hrp_for_network(network_id: u32) -> Option<&'static str> {
    match network_id {
        NETWORK_ID_MAINNET => Some(MAINNET_HRP),
        NETWORK_ID_TESTNET => Some(TESTNET_HRP),
        NETWORK_ID_DEVNET => Some(DEVNET_HRP),
        _ => None,
    }
}

/// Returns a friendly name for a network ID, mainly for logging.
/// Unknown networks get a hex dump because we're helpful like that.
pub fn network_name(network_id: u32) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        NETWORK_ID_DEVNET => "devnet".to_string(),
        other => format!("unknown(0x{:08X})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids_are_distinct() {
        // If these collide, someone has been editing hex while sleep-deprived.
        assert_ne!(NETWORK_ID_MAINNET, NETWORK_ID_TESTNET);
        assert_ne!(NETWORK_ID_MAINNET, NETWORK_ID_DEVNET);
        assert_ne!(NETWORK_ID_TESTNET, NETWORK_ID_DEVNET);
    }

    #[test]
    fn test_protocol_magic_is_valid_ascii() {
        // The magic bytes should decode to a readable 4-char ASCII tag.
        let bytes = PROTOCOL_MAGIC.to_be_bytes();
        assert!(bytes.iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_network_ids_are_valid_ascii() {
        for id in [NETWORK_ID_MAINNET, NETWORK_ID_TESTNET, NETWORK_ID_DEVNET] {
            let bytes = id.to_be_bytes();
            assert!(bytes.iter().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_protocol_fingerprint_format() {
        // Fingerprint must be non-empty and contain the protocol family name.
        assert!(!PROTOCOL_FINGERPRINT.is_empty());
        assert!(PROTOCOL_FINGERPRINT.contains("KEEL"));
    }

    #[test]
    fn test_hrp_for_known_networks() {
        assert_eq!(hrp_for_network(NETWORK_ID_MAINNET), Some("keel"));
        assert_eq!(hrp_for_network(NETWORK_ID_TESTNET), Some("tkeel"));
        assert_eq!(hrp_for_network(NETWORK_ID_DEVNET), Some("dkeel"));
    }

    #[test]
    fn test_hrp_for_unknown_network() {
        assert_eq!(hrp_for_network(0xDEADBEEF), None);
    }

    #[test]
    fn test_network_name_formatting() {
        assert_eq!(network_name(NETWORK_ID_MAINNET), "mainnet");
        assert_eq!(network_name(0xCAFEBABE), "unknown(0xCAFEBABE)");
    }

    #[test]
    fn test_peg_field_limits_sanity() {
        // Min should be less than max. Obvious, but stranger things have
        // shipped to production.
        assert!(TRANSACTION_ID_MIN_LENGTH < TRANSACTION_ID_MAX_LENGTH);
        assert!(MAX_PEG_HASH_LENGTH > 0);
        assert!(MAX_BATCH_INSTRUCTIONS > 0);
    }

    #[test]
    fn test_storage_trees_are_distinct() {
        assert_ne!(TREE_ASSET_PEGS, TREE_FIAT_PEGS);
        assert_ne!(TREE_ASSET_PEGS, TREE_META);
        assert_ne!(TREE_FIAT_PEGS, TREE_META);
    }

    #[test]
    fn test_peg_key_prefix_shape() {
        // The tag ends with a separator so raw hashes can't collide with it.
        assert!(PEG_KEY_PREFIX.ends_with(b":"));
        assert!(!PEG_KEY_PREFIX.is_empty());
    }
}
