//! # Genesis Configuration & Seeding
//!
//! A KEEL ledger starts from a pool of reserved peg hashes: placeholder
//! asset pegs owned by the genesis issuer, and empty fiat pegs. `init`
//! writes the pool parameters to `genesis.json`; `run` reads them back and
//! seeds the store.
//!
//! Seeding is guarded by the store's genesis marker, so restarting a node
//! never reallocates or resets pegs.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use keel_protocol::store::{set_asset_peg, set_fiat_peg, LedgerDb};
use keel_protocol::types::{Address, AssetPeg, FiatPeg, PegHash};

/// Parameters of a ledger's genesis, as written to `genesis.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Network name recorded in the store and reported by `/status`.
    pub network: String,
    /// Bech32 account that owns every asset placeholder and authorizes
    /// issuance.
    pub issuer: String,
    /// Number of asset peg hashes reserved at genesis.
    pub asset_pegs: u32,
    /// Number of fiat peg hashes reserved at genesis.
    pub fiat_pegs: u32,
}

impl GenesisConfig {
    /// Reads and parses a `genesis.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read genesis file at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse genesis file at {}", path.display()))
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("failed to encode genesis config")?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write genesis file at {}", path.display()))
    }

    /// The issuer as a ledger address.
    pub fn issuer_address(&self) -> Result<Address> {
        Address::from_bech32(&self.issuer).with_context(|| {
            format!("genesis issuer {:?} is not a valid bech32 address", self.issuer)
        })
    }
}

/// Seeds placeholder pegs and marks genesis, exactly once per store.
///
/// Asset placeholders take hashes `0..asset_pegs` and are owned by the
/// issuer; fiat placeholders take the next `fiat_pegs` hashes with empty
/// owner rosters. Returns `true` when this call performed the seeding and
/// `false` when the store already carried a genesis marker.
pub fn seed_ledger(db: &mut LedgerDb, config: &GenesisConfig) -> Result<bool> {
    if let Some(network) = db.genesis_network().context("failed to read genesis marker")? {
        if network != config.network {
            bail!(
                "store was seeded for network {:?} but genesis.json names {:?}",
                network,
                config.network
            );
        }
        tracing::info!(network = %network, "genesis already seeded, skipping");
        return Ok(false);
    }

    let issuer = config.issuer_address()?;
    for index in 0..config.asset_pegs as u64 {
        let placeholder = AssetPeg::placeholder(PegHash::from_index(index), issuer.clone());
        set_asset_peg(db, &placeholder).context("failed to seed asset placeholder")?;
    }
    let fiat_base = config.asset_pegs as u64;
    for index in fiat_base..fiat_base + config.fiat_pegs as u64 {
        let placeholder = FiatPeg::placeholder(PegHash::from_index(index));
        set_fiat_peg(db, &placeholder).context("failed to seed fiat placeholder")?;
    }

    db.mark_genesis(&config.network)
        .context("failed to write genesis marker")?;
    db.flush().context("failed to flush seeded store")?;

    tracing::info!(
        network = %config.network,
        issuer = %issuer,
        asset_pegs = config.asset_pegs,
        fiat_pegs = config.fiat_pegs,
        "genesis seeded"
    );
    Ok(true)
}
