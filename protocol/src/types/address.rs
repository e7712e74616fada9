//! Account and escrow addresses.
//!
//! Two shapes share one type. Regular account addresses are 20 bytes and
//! travel as bech32 strings with the `keel` prefix. Escrow pseudo-accounts
//! are derived by concatenating two addresses and a peg hash, are never
//! handed to users, and render as hex when they show up in logs or audit
//! events. Authorization checks compare raw bytes in both cases — an
//! escrowed peg is released by whoever can reproduce the exact derivation,
//! not by whoever can re-encode a string.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_ADDRESS_LENGTH, MAINNET_HRP};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when parsing an [`Address`].
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The hex string could not be decoded.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// Addresses identify parties; an empty one identifies nobody.
    #[error("address must not be empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A party on the ledger: an account or a derived escrow pseudo-account.
///
/// Equality and ordering are over the raw bytes. Display picks the
/// friendliest faithful encoding: bech32 for account-length addresses,
/// plain hex for everything else.
///
/// # Examples
///
/// ```
/// use keel_protocol::types::Address;
///
/// let alice = Address::from_raw(vec![0x11; 20]);
/// let shown = alice.to_string();
/// assert!(shown.starts_with("keel1"));
/// assert_eq!(shown.parse::<Address>().unwrap(), alice);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<u8>);

impl Address {
    /// Wraps raw bytes without validation.
    ///
    /// Escrow derivation concatenates byte strings of arbitrary length,
    /// so this constructor accepts whatever it is given.
    pub fn from_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parses a bech32 account address with the `keel` prefix.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(MAINNET_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressError::InvalidHrp {
                expected: MAINNET_HRP.to_string(),
                got: hrp.to_string(),
            });
        }
        if data.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(data))
    }

    /// Parses a hex-encoded address, the form escrow pseudo-accounts use.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(bytes))
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no bytes are present. Only reachable through `from_raw`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for standard account-length addresses. Escrow pseudo-accounts
    /// are always longer (two accounts plus a peg hash).
    pub fn is_account(&self) -> bool {
        self.0.len() == ACCOUNT_ADDRESS_LENGTH
    }

    fn to_bech32(&self) -> String {
        let hrp = Hrp::parse(MAINNET_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.0)
            .expect("encoding an account-length payload should never fail")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_account() {
            write!(f, "{}", self.to_bech32())
        } else {
            write!(f, "{}", hex::encode(&self.0))
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Hex never contains the HRP separator pattern, so the prefix is
        // an unambiguous discriminator.
        if s.starts_with(MAINNET_HRP) {
            Self::from_bech32(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.is_empty() {
                return Err(serde::de::Error::custom("address must not be empty"));
            }
            Ok(Address(bytes))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tag: u8) -> Address {
        Address::from_raw(vec![tag; ACCOUNT_ADDRESS_LENGTH])
    }

    #[test]
    fn account_displays_as_bech32() {
        let addr = account(0x42);
        let shown = addr.to_string();
        assert!(shown.starts_with("keel1"), "address was: {}", shown);
    }

    #[test]
    fn bech32_roundtrip() {
        let addr = account(0x07);
        let recovered = Address::from_bech32(&addr.to_string()).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn long_address_displays_as_hex() {
        let addr = Address::from_raw(vec![0xaa; 45]);
        let shown = addr.to_string();
        assert_eq!(shown, "aa".repeat(45));
        assert!(!addr.is_account());
    }

    #[test]
    fn fromstr_accepts_both_encodings() {
        let short = account(0x03);
        let long = Address::from_raw(vec![0x0b; 48]);
        assert_eq!(short.to_string().parse::<Address>().unwrap(), short);
        assert_eq!(long.to_string().parse::<Address>().unwrap(), long);
    }

    #[test]
    fn wrong_hrp_rejected() {
        let hrp = Hrp::parse("nova").unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &[0u8; 20]).unwrap();
        let err = Address::from_bech32(&encoded).unwrap_err();
        assert!(matches!(err, AddressError::InvalidHrp { .. }));
    }

    #[test]
    fn corrupted_bech32_rejected() {
        let shown = account(0x01).to_string();
        let mid = shown.len() / 2;
        let flipped: String = shown
            .char_indices()
            .map(|(i, c)| match (i == mid, c) {
                (true, 'q') => 'p',
                (true, _) => 'q',
                (false, _) => c,
            })
            .collect();
        assert!(Address::from_bech32(&flipped).is_err());
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(matches!(
            Address::from_hex("not hex"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn equality_is_byte_wise() {
        assert_eq!(account(0x09), account(0x09));
        assert_ne!(account(0x09), account(0x0a));
        assert_ne!(account(0x09), Address::from_raw(vec![0x09; 21]));
    }

    #[test]
    fn serde_json_roundtrip_for_both_shapes() {
        for addr in [account(0x11), Address::from_raw(vec![0x22; 52])] {
            let json = serde_json::to_string(&addr).unwrap();
            let back: Address = serde_json::from_str(&json).unwrap();
            assert_eq!(back, addr);
        }
    }

    #[test]
    fn bincode_roundtrip_preserves_bytes() {
        let addr = Address::from_raw(vec![0x33; 47]);
        let bytes = bincode::serialize(&addr).unwrap();
        let back: Address = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, addr);
    }
}
