// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KEEL Settlement Node
//!
//! Entry point for the `keel-node` binary. Parses CLI arguments, initializes
//! logging and metrics, opens the peg store, and serves the HTTP/WS API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the settlement node
//! - `init`    — initialize a data directory and write its genesis config
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod genesis;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use keel_protocol::store::LedgerDb;

use cli::{Commands, KeelNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb a full-size batch's events without
/// dropping any for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KeelNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full settlement node: API server and metrics endpoint over
/// a seeded peg store.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, LogFormat::from_str_lossy(&args.log_format));

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting keel-node"
    );

    // --- Genesis configuration ---
    let genesis_path = args.data_dir.join("genesis.json");
    let genesis_config = genesis::GenesisConfig::load(&genesis_path).with_context(|| {
        format!(
            "cannot load genesis config from {} (run `keel-node init` first)",
            genesis_path.display()
        )
    })?;

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let mut db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "store opened");

    // Seeds the placeholder pools on first run; later runs verify the
    // network marker and skip.
    genesis::seed_ledger(&mut db, &genesis_config)?;

    let ledger = Arc::new(RwLock::new(db));

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            keel_protocol::config::PROTOCOL_VERSION,
        ),
        network: genesis_config.network.clone(),
        ledger: Arc::clone(&ledger),
        event_tx: event_tx.clone(),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    if let Err(e) = ledger.read().flush() {
        tracing::error!("failed to flush store on shutdown: {}", e);
    }
    tracing::info!("keel-node stopped");
    Ok(())
}

/// Initializes a new node data directory and writes its genesis config.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("keel_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), network = %args.network, "initializing node");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let genesis_path = data_dir.join("genesis.json");
    if genesis_path.exists() {
        bail!(
            "{} already exists; refusing to overwrite an initialized node",
            genesis_path.display()
        );
    }

    let config = genesis::GenesisConfig {
        network: args.network.clone(),
        issuer: args.issuer.clone(),
        asset_pegs: args.asset_pegs,
        fiat_pegs: args.fiat_pegs,
    };

    // Catch a bad issuer now instead of on first run.
    config.issuer_address()?;
    config.write(&genesis_path)?;

    tracing::info!(
        genesis = %genesis_path.display(),
        issuer = %args.issuer,
        "genesis config written"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Network        : {}", args.network);
    println!("  Genesis file   : {}", genesis_path.display());
    println!("  Issuer         : {}", args.issuer);
    println!("  Asset pegs     : {}", args.asset_pegs);
    println!("  Fiat pegs      : {}", args.fiat_pegs);

    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.api_url.trim_end_matches('/'));
    let body: String = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET without pulling in an HTTP client dependency.
/// In a real deployment, swap this for a proper HTTP client.
async fn http_get(url: &str) -> Result<String> {
    let parsed: url::Url = url
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing host in URL"))?;
    let port = parsed.port().unwrap_or(80);
    let path = parsed.path();

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Strip HTTP headers — everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("keel-node {}", env!("CARGO_PKG_VERSION"));
    println!(
        "protocol  {} ({})",
        keel_protocol::config::PROTOCOL_VERSION,
        keel_protocol::config::PROTOCOL_FINGERPRINT,
    );
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Minimal URL parser — just enough to extract host/port/path.
/// Avoids pulling in the `url` crate for a single use.
mod url {
    pub struct Url {
        host: String,
        port: Option<u16>,
        path: String,
    }

    impl Url {
        pub fn host_str(&self) -> Option<&str> {
            Some(&self.host)
        }

        pub fn port(&self) -> Option<u16> {
            self.port
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            // Strip scheme.
            let rest = s
                .strip_prefix("http://")
                .or_else(|| s.strip_prefix("https://"))
                .unwrap_or(s);

            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };

            let (host, port) = match authority.rfind(':') {
                Some(i) => {
                    let p = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|e| format!("bad port: {}", e))?;
                    (authority[..i].to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };

            Ok(Url {
                host,
                port,
                path: path.to_string(),
            })
        }
    }
}
