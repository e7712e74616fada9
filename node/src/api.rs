//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the settlement node's HTTP
//! interface. All endpoints share application state through axum's `State`
//! extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                          |
//! |--------|----------------------|--------------------------------------|
//! | GET    | `/health`            | Liveness probe                       |
//! | GET    | `/status`            | Node status and peg counts           |
//! | POST   | `/batches`           | Apply an instruction batch atomically|
//! | GET    | `/ws`                | WebSocket for the audit event stream |
//! | GET    | `/assets/:peg_hash`  | Asset peg by hex hash                |
//! | GET    | `/fiats/:peg_hash`   | Fiat peg by hex hash                 |
//! | GET    | `/accounts/:address` | Holdings of an account or escrow     |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use keel_protocol::config::MAX_BATCH_INSTRUCTIONS;
use keel_protocol::events::Event;
use keel_protocol::factory::{self, LedgerError};
use keel_protocol::instruction::{dispatch, InstructionBatch};
use keel_protocol::store::{LedgerDb, TxContext};
use keel_protocol::types::{Address, AssetPeg, FiatPeg, PegHash};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network name from the genesis configuration.
    pub network: String,
    /// The persistent peg store. Batches serialize behind the write half;
    /// queries share the read half.
    pub ledger: Arc<RwLock<LedgerDb>>,
    /// Broadcast channel carrying committed batches' audit events.
    pub event_tx: broadcast::Sender<Event>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/batches", post(submit_batch_handler))
        .route("/ws", get(ws_handler))
        .route("/assets/:peg_hash", get(asset_handler))
        .route("/fiats/:peg_hash", get(fiat_handler))
        .route("/accounts/:address", get(account_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network identifier from genesis.
    pub network: String,
    /// Number of asset peg records, placeholders included.
    pub asset_pegs: usize,
    /// Number of fiat peg records, placeholders included.
    pub fiat_pegs: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    /// The address as the ledger renders it: bech32 for accounts, hex for
    /// escrow pseudo-accounts.
    pub address: String,
    /// Live asset pegs owned by the address.
    pub assets: Vec<AssetPeg>,
    /// Fiat share fragments held by the address, one per peg.
    pub fiat_fragments: Vec<FiatPeg>,
    /// Sum of the fiat fragments.
    pub fiat_balance: i64,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body for a batch that failed dispatch, naming the instruction
/// that broke it.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRejection {
    pub error: String,
    /// Zero-based position of the failing instruction.
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not check store health — that belongs in
/// `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns the node summary with live peg counts.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (asset_pegs, fiat_pegs) = {
        let db = state.ledger.read();
        (db.asset_peg_count(), db.fiat_peg_count())
    };

    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        asset_pegs,
        fiat_pegs,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /batches` — applies an [`InstructionBatch`] atomically.
///
/// Dispatch runs against a buffered [`TxContext`]; the overlay is committed
/// only when every instruction succeeds. A failed batch returns 422 naming
/// the failing instruction and leaves the store untouched. Committed
/// batches broadcast their audit events to WebSocket subscribers.
async fn submit_batch_handler(
    State(state): State<AppState>,
    Json(batch): Json<InstructionBatch>,
) -> impl IntoResponse {
    if batch.len() > MAX_BATCH_INSTRUCTIONS {
        let err = ErrorResponse {
            error: format!(
                "batch carries {} instructions, limit is {}",
                batch.len(),
                MAX_BATCH_INSTRUCTIONS
            ),
        };
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::to_value(err).unwrap()),
        )
            .into_response();
    }

    state.metrics.batches_submitted_total.inc();
    // Records into the latency histogram when dropped, on every path.
    let _timer = state.metrics.batch_apply_seconds.start_timer();

    let receipt = {
        let mut db = state.ledger.write();
        let mut ctx = TxContext::new(&mut *db);
        match dispatch(&mut ctx, &batch) {
            Ok(receipt) => {
                if let Err(e) = ctx.commit() {
                    tracing::error!(error = %e, "batch commit failed, store may be broken");
                    state.metrics.batches_failed_total.inc();
                    let err = ErrorResponse {
                        error: format!("store failure: {}", e),
                    };
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::to_value(err).unwrap()),
                    )
                        .into_response();
                }
                receipt
            }
            Err(err) => {
                ctx.discard();
                state.metrics.batches_failed_total.inc();
                let rejection = BatchRejection {
                    error: err.source.to_string(),
                    index: err.index,
                };
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::to_value(rejection).unwrap()),
                )
                    .into_response();
            }
        }
    };

    state
        .metrics
        .instructions_applied_total
        .inc_by(receipt.instructions_applied as u64);
    state
        .metrics
        .events_emitted_total
        .inc_by(receipt.events.len() as u64);

    for event in &receipt.events {
        // Send only fails when nobody subscribes, which is fine.
        let _ = state.event_tx.send(event.clone());
    }

    (StatusCode::OK, Json(serde_json::to_value(receipt).unwrap())).into_response()
}

/// `GET /assets/:peg_hash` — returns the asset peg under a hex hash.
///
/// Returns 404 for hashes with no record and 400 for strings that do not
/// parse as hex.
async fn asset_handler(
    Path(peg_hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let hash = match PegHash::from_hex(&peg_hash) {
        Ok(hash) => hash,
        Err(e) => {
            let err = ErrorResponse {
                error: format!("invalid peg hash: {}", e),
            };
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response();
        }
    };

    let loaded = {
        let db = state.ledger.read();
        factory::asset_peg(&*db, &hash)
    };

    match loaded {
        Ok(peg) => (StatusCode::OK, Json(serde_json::to_value(peg).unwrap())).into_response(),
        Err(e @ LedgerError::AssetNotFound(_)) => {
            let err = ErrorResponse {
                error: e.to_string(),
            };
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
        Err(e) => {
            let err = ErrorResponse {
                error: format!("store failure: {}", e),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /fiats/:peg_hash` — returns the fiat peg under a hex hash,
/// including its full owner roster.
async fn fiat_handler(
    Path(peg_hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let hash = match PegHash::from_hex(&peg_hash) {
        Ok(hash) => hash,
        Err(e) => {
            let err = ErrorResponse {
                error: format!("invalid peg hash: {}", e),
            };
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response();
        }
    };

    let loaded = {
        let db = state.ledger.read();
        factory::fiat_peg(&*db, &hash)
    };

    match loaded {
        Ok(peg) => (StatusCode::OK, Json(serde_json::to_value(peg).unwrap())).into_response(),
        Err(e @ LedgerError::FiatNotFound(_)) => {
            let err = ErrorResponse {
                error: e.to_string(),
            };
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
        Err(e) => {
            let err = ErrorResponse {
                error: format!("store failure: {}", e),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /accounts/:address` — returns the holdings of an account or an
/// escrow pseudo-account.
///
/// Accepts bech32 for accounts and hex for escrow addresses, the same two
/// renderings the ledger emits. An address with no pegs is a valid, boring
/// account and returns empty holdings rather than 404.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let parsed = match address.parse::<Address>() {
        Ok(parsed) => parsed,
        Err(e) => {
            let err = ErrorResponse {
                error: format!("invalid address: {}", e),
            };
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response();
        }
    };

    let holdings = {
        let db = state.ledger.read();
        factory::owned_assets(&*db, &parsed).and_then(|assets| {
            factory::owned_fiat_fragments(&*db, &parsed).map(|fiat| (assets, fiat))
        })
    };

    match holdings {
        Ok((assets, fragments)) => {
            let resp = AccountResponse {
                address: parsed.to_string(),
                assets: assets.pegs().to_vec(),
                fiat_balance: fragments.balance(),
                fiat_fragments: fragments.pegs().to_vec(),
            };
            (StatusCode::OK, Json(serde_json::to_value(resp).unwrap())).into_response()
        }
        Err(e) => {
            let err = ErrorResponse {
                error: format!("store failure: {}", e),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /ws` — WebSocket upgrade for the live audit event stream.
///
/// Subscribers receive every committed batch's events as individual
/// JSON-encoded [`Event`] messages. The connection is push-only; client
/// messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();
    state.metrics.ws_subscribers.inc();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Client messages are ignored — this is a push-only channel.
                    }
                    _ => break, // Disconnected or error.
                }
            }
        }
    }

    state.metrics.ws_subscribers.dec();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use keel_protocol::escrow::escrow_address;
    use keel_protocol::instruction::{BatchReceipt, Instruction};
    use keel_protocol::store::{set_asset_peg, set_fiat_peg};
    use keel_protocol::types::FiatWallet;
    use tower::ServiceExt;

    fn addr(tag: u8) -> Address {
        Address::from_raw(vec![tag; 20])
    }

    /// An AppState over a temporary store seeded like genesis: asset
    /// placeholders `0..assets` owned by `addr(1)`, fiat placeholders on
    /// the following hashes.
    fn seeded_app_state(assets: u64, fiats: u64) -> AppState {
        let mut db = LedgerDb::open_temporary().expect("temp db");
        let issuer = addr(1);
        for index in 0..assets {
            let placeholder = AssetPeg::placeholder(PegHash::from_index(index), issuer.clone());
            set_asset_peg(&mut db, &placeholder).expect("seed asset placeholder");
        }
        for index in assets..assets + fiats {
            let placeholder = FiatPeg::placeholder(PegHash::from_index(index));
            set_fiat_peg(&mut db, &placeholder).expect("seed fiat placeholder");
        }

        let (event_tx, _) = broadcast::channel(16);
        AppState {
            version: "0.1.0-test".into(),
            network: "devnet".into(),
            ledger: Arc::new(RwLock::new(db)),
            event_tx,
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
        }
    }

    fn issuable_asset(index: u64) -> AssetPeg {
        AssetPeg {
            peg_hash: PegHash::from_index(index),
            document_hash: "bafkreigh2akiscaild".to_string(),
            asset_type: "ceylon tea".to_string(),
            asset_quantity: 2_000,
            asset_price: 500_000,
            quantity_unit: "kg".to_string(),
            owner: Address::from_raw(Vec::new()),
            locked: false,
            moderated: false,
            taker: None,
        }
    }

    fn issuable_fiat(index: u64, amount: i64) -> FiatPeg {
        FiatPeg {
            peg_hash: PegHash::from_index(index),
            transaction_id: "UTIB0001443".to_string(),
            transaction_amount: amount,
            redeemed_amount: 0,
            owners: Vec::new(),
        }
    }

    /// A wallet fragment naming a fiat peg and a transfer amount.
    fn fragment(index: u64, amount: i64) -> FiatPeg {
        FiatPeg {
            peg_hash: PegHash::from_index(index),
            transaction_id: String::new(),
            transaction_amount: amount,
            redeemed_amount: 0,
            owners: Vec::new(),
        }
    }

    /// Sends a GET request and returns (status, body bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with a JSON body and returns (status, body bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    async fn submit(router: &Router, batch: &InstructionBatch) -> (StatusCode, Vec<u8>) {
        post_json(router, "/batches", serde_json::to_value(batch).unwrap()).await
    }

    // -- 1. Health endpoint -------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(seeded_app_state(0, 0));
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    // -- 2. Status reports live peg counts ----------------------------------

    #[tokio::test]
    async fn status_reports_live_peg_counts() {
        let router = create_router(seeded_app_state(3, 2));
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.asset_pegs, 3);
        assert_eq!(resp.fiat_pegs, 2);
        assert_eq!(resp.network, "devnet");
        assert_eq!(resp.version, "0.1.0-test");
    }

    // -- 3. Submitting a batch settles and persists --------------------------

    #[tokio::test]
    async fn submitting_a_batch_returns_a_receipt_and_persists() {
        let state = seeded_app_state(1, 0);
        let router = create_router(state);
        let recipient = addr(2);

        let batch = InstructionBatch::new(vec![Instruction::IssueAsset {
            issuer: addr(1),
            recipient: recipient.clone(),
            peg: issuable_asset(0),
        }]);
        let (status, body) = submit(&router, &batch).await;

        assert_eq!(status, StatusCode::OK);
        let receipt: BatchReceipt = serde_json::from_slice(&body).unwrap();
        assert_eq!(receipt.instructions_applied, 1);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].kind(), "asset_issued");

        // The write is visible through the query surface.
        let path = format!("/assets/{}", PegHash::from_index(0).to_hex());
        let (status, body) = get(&router, &path).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["owner"], recipient.to_string());
        assert_eq!(json["asset_type"], "ceylon tea");
    }

    // -- 4. A failing batch returns 422 and writes nothing --------------------

    #[tokio::test]
    async fn failing_batch_returns_422_and_writes_nothing() {
        let state = seeded_app_state(1, 0);
        let router = create_router(state);
        let issuer = addr(1);

        // The second instruction acts from an address that holds nothing.
        let batch = InstructionBatch::new(vec![
            Instruction::IssueAsset {
                issuer: issuer.clone(),
                recipient: addr(2),
                peg: issuable_asset(0),
            },
            Instruction::SendAsset {
                from: addr(9),
                to: addr(3),
                peg_hash: PegHash::from_index(0),
            },
        ]);
        let (status, body) = submit(&router, &batch).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let rejection: BatchRejection = serde_json::from_slice(&body).unwrap();
        assert_eq!(rejection.index, 1);
        assert!(rejection.error.contains("not authorized"));

        // The issuance in the same batch must not have landed either.
        let path = format!("/assets/{}", PegHash::from_index(0).to_hex());
        let (_, body) = get(&router, &path).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["owner"], issuer.to_string());
        assert_eq!(json["asset_type"], "");
    }

    // -- 5. Oversized batches are rejected before dispatch --------------------

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_dispatch() {
        let state = seeded_app_state(0, 0);
        let router = create_router(state.clone());

        let flood = vec![
            Instruction::SendAsset {
                from: addr(1),
                to: addr(2),
                peg_hash: PegHash::from_index(0),
            };
            MAX_BATCH_INSTRUCTIONS + 1
        ];
        let (status, body) = submit(&router, &InstructionBatch::new(flood)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("limit"));
        // Rejected at the door: never counted as submitted.
        assert_eq!(state.metrics.batches_submitted_total.get(), 0);
    }

    // -- 6. Asset endpoint rejects malformed hashes ---------------------------

    #[tokio::test]
    async fn asset_endpoint_rejects_malformed_hashes() {
        let router = create_router(seeded_app_state(1, 0));
        let (status, body) = get(&router, "/assets/zzzz").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("invalid peg hash"));
    }

    // -- 7. Asset endpoint returns 404 for unknown hashes ---------------------

    #[tokio::test]
    async fn asset_endpoint_returns_404_for_unknown_hashes() {
        let router = create_router(seeded_app_state(1, 0));
        let path = format!("/assets/{}", PegHash::from_index(7).to_hex());
        let (status, body) = get(&router, &path).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("not found"));
    }

    // -- 8. Fiat endpoint shows the owner roster ------------------------------

    #[tokio::test]
    async fn fiat_endpoint_shows_owner_shares() {
        let router = create_router(seeded_app_state(0, 1));
        let holder = addr(2);

        let batch = InstructionBatch::new(vec![Instruction::IssueFiat {
            issuer: addr(1),
            recipient: holder.clone(),
            peg: issuable_fiat(0, 900),
        }]);
        let (status, _) = submit(&router, &batch).await;
        assert_eq!(status, StatusCode::OK);

        let path = format!("/fiats/{}", PegHash::from_index(0).to_hex());
        let (status, body) = get(&router, &path).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["transaction_amount"], 900);
        assert_eq!(json["owners"][0]["address"], holder.to_string());
        assert_eq!(json["owners"][0]["amount"], 900);
    }

    // -- 9. Account endpoint lists holdings -----------------------------------

    #[tokio::test]
    async fn account_endpoint_lists_holdings() {
        let router = create_router(seeded_app_state(1, 1));
        let holder = addr(2);

        let batch = InstructionBatch::new(vec![
            Instruction::IssueAsset {
                issuer: addr(1),
                recipient: holder.clone(),
                peg: issuable_asset(0),
            },
            Instruction::IssueFiat {
                issuer: addr(1),
                recipient: holder.clone(),
                peg: issuable_fiat(1, 750),
            },
        ]);
        let (status, _) = submit(&router, &batch).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(&router, &format!("/accounts/{}", holder)).await;
        assert_eq!(status, StatusCode::OK);
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.address, holder.to_string());
        assert_eq!(resp.assets.len(), 1);
        assert_eq!(resp.fiat_fragments.len(), 1);
        assert_eq!(resp.fiat_balance, 750);
    }

    // -- 10. Account endpoint reads escrow custody by hex ----------------------

    #[tokio::test]
    async fn account_endpoint_reads_escrow_custody_by_hex() {
        let router = create_router(seeded_app_state(1, 1));
        let buyer = addr(2);
        let seller = addr(3);
        let order_hash = PegHash::from_index(0);

        let batch = InstructionBatch::new(vec![
            Instruction::IssueFiat {
                issuer: addr(1),
                recipient: buyer.clone(),
                peg: issuable_fiat(1, 500),
            },
            Instruction::SendFiat {
                from: buyer.clone(),
                to: seller.clone(),
                peg_hash: order_hash.clone(),
                wallet: FiatWallet::from_pegs(vec![fragment(1, 200)]),
            },
        ]);
        let (status, _) = submit(&router, &batch).await;
        assert_eq!(status, StatusCode::OK);

        let escrow = escrow_address(&buyer, &seller, &order_hash);
        let path = format!("/accounts/{}", hex::encode(escrow.as_bytes()));
        let (status, body) = get(&router, &path).await;
        assert_eq!(status, StatusCode::OK);
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.address, escrow.to_string());
        assert_eq!(resp.fiat_balance, 200);

        // The holder keeps the rest.
        let (_, body) = get(&router, &format!("/accounts/{}", buyer)).await;
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.fiat_balance, 300);
    }

    // -- 11. Committed batches reach event subscribers --------------------------

    #[tokio::test]
    async fn committed_batches_reach_event_subscribers() {
        let state = seeded_app_state(1, 0);
        let mut rx = state.event_tx.subscribe();
        let router = create_router(state);

        let batch = InstructionBatch::new(vec![Instruction::IssueAsset {
            issuer: addr(1),
            recipient: addr(2),
            peg: issuable_asset(0),
        }]);
        let (status, _) = submit(&router, &batch).await;
        assert_eq!(status, StatusCode::OK);

        let event = rx.try_recv().expect("event broadcast");
        assert_eq!(event.kind(), "asset_issued");
    }

    // -- 12. Metrics track batch outcomes ---------------------------------------

    #[tokio::test]
    async fn metrics_track_batch_outcomes() {
        let state = seeded_app_state(1, 0);
        let router = create_router(state.clone());

        let good = InstructionBatch::new(vec![Instruction::IssueAsset {
            issuer: addr(1),
            recipient: addr(2),
            peg: issuable_asset(0),
        }]);
        let (status, _) = submit(&router, &good).await;
        assert_eq!(status, StatusCode::OK);

        let bad = InstructionBatch::new(vec![Instruction::SendAsset {
            from: addr(9),
            to: addr(3),
            peg_hash: PegHash::from_index(0),
        }]);
        let (status, _) = submit(&router, &bad).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(state.metrics.batches_submitted_total.get(), 2);
        assert_eq!(state.metrics.batches_failed_total.get(), 1);
        assert_eq!(state.metrics.instructions_applied_total.get(), 1);
        assert_eq!(state.metrics.events_emitted_total.get(), 1);
    }
}
