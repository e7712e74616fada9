//! # CLI Interface
//!
//! Defines the command-line argument structure for `keel-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `status`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use keel_protocol::config::{DEFAULT_API_PORT, DEFAULT_GENESIS_PEG_COUNT, DEFAULT_METRICS_PORT};

/// KEEL settlement ledger node.
///
/// A single-host settlement node for tokenized real-world assets and fiat
/// claims. Applies instruction batches against the persistent peg store,
/// serves the REST/WebSocket API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "keel-node",
    about = "KEEL settlement ledger node",
    version,
    propagate_version = true
)]
pub struct KeelNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the KEEL node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the settlement node.
    Run(RunArgs),
    /// Initialize a new node — creates the data directory and writes the
    /// genesis parameters.
    Init(InitArgs),
    /// Query the status of a running node via its API endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node data directory holding the store and genesis file.
    ///
    /// Must have been prepared with `keel-node init`.
    #[arg(long, short = 'd', env = "KEEL_DATA_DIR", default_value = "~/.keel")]
    pub data_dir: PathBuf,

    /// Port for the REST and WebSocket API.
    #[arg(long, env = "KEEL_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "KEEL_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        env = "KEEL_LOG",
        default_value = "keel_node=info,keel_protocol=info"
    )]
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "KEEL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "KEEL_DATA_DIR", default_value = "~/.keel")]
    pub data_dir: PathBuf,

    /// Network to configure: mainnet, testnet, or devnet.
    #[arg(long, default_value = "devnet")]
    pub network: String,

    /// Bech32 account that owns the genesis placeholder pool and
    /// authorizes issuance.
    #[arg(long)]
    pub issuer: String,

    /// Number of asset peg hashes to reserve at genesis.
    #[arg(long, default_value_t = DEFAULT_GENESIS_PEG_COUNT)]
    pub asset_pegs: u32,

    /// Number of fiat peg hashes to reserve at genesis.
    #[arg(long, default_value_t = DEFAULT_GENESIS_PEG_COUNT)]
    pub fiat_pegs: u32,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// API endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9750")]
    pub api_url: String,
}
