//! REST API server for Replichain
//!
//! JSON endpoints for mining, transaction submission, chain inspection and
//! peer management. The handlers are the service layer over the ledger core:
//! they own request/response shapes and status codes, while all chain
//! semantics stay in [`crate::ledger`] and [`crate::sync`].

use axum::{
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::block::Block;
use crate::config::MiningConfig;
use crate::error::ChainError;
use crate::ledger::Ledger;
use crate::sync::{resolve_conflicts, PeerClient};
use crate::transaction::Transaction;

/// Sender recorded on the reward transaction queued for each mined block.
pub const MINING_REWARD_SENDER: &str = "mining_reward_generator";

/// Shared state behind every handler.
pub struct ApiContext {
    pub ledger: Arc<RwLock<Ledger>>,
    /// This node's own address; mining rewards are credited to it.
    pub node_address: String,
    pub mining: MiningConfig,
    pub peer_client: Arc<dyn PeerClient>,
    /// Optional orchestrator state for health checks.
    pub node_state: Option<Arc<RwLock<crate::node::NodeState>>>,
    api_stats: RwLock<ApiStats>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    blocks_mined: u64,
    transactions_submitted: u64,
    chains_replaced: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl ApiContext {
    pub fn new(
        ledger: Arc<RwLock<Ledger>>,
        node_address: String,
        mining: MiningConfig,
        peer_client: Arc<dyn PeerClient>,
        node_state: Option<Arc<RwLock<crate::node::NodeState>>>,
    ) -> Self {
        ApiContext {
            ledger,
            node_address,
            mining,
            peer_client,
            node_state,
            api_stats: RwLock::new(ApiStats::new()),
        }
    }

    /// Mine one block: run the proof search, queue the reward transaction
    /// and seal the pool.
    ///
    /// The search runs on a blocking worker with no lock held; only the
    /// final reward-and-seal step takes the write lock, so transaction
    /// submission and resolution proceed while the miner scans.
    pub async fn mine_one(&self) -> Result<Block, ApiError> {
        let (last_proof, difficulty) = {
            let guard = self.ledger.read().await;
            (guard.last_block().proof, guard.difficulty())
        };

        let max_attempts = self.mining.max_attempts;
        let proof =
            tokio::task::spawn_blocking(move || crate::pow::proof_of_work(last_proof, difficulty, max_attempts))
                .await
                .map_err(|e| ApiError::Internal(format!("proof search task failed: {}", e)))??;

        let block = {
            let mut guard = self.ledger.write().await;
            guard.new_transaction(
                MINING_REWARD_SENDER,
                &self.node_address,
                self.mining.reward_amount,
            )?;
            guard.new_block(proof, &self.node_address, None).clone()
        };

        let mut stats = self.api_stats.write().await;
        stats.blocks_mined += 1;

        Ok(block)
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Chain(ChainError),
    InvalidInput(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Chain(ChainError::ProofSearchExhausted(attempts)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("proof search exhausted after {} attempts", attempts),
            ),
            ApiError::Chain(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Deserialize)]
pub struct NewTransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Serialize)]
struct NewTransactionResponse {
    message: String,
}

/// The wire format peers consume; must stay in lockstep with
/// [`crate::sync::RemoteChain`].
#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: u64,
}

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
struct RegisterNodesResponse {
    message: String,
    total_nodes: Vec<String>,
}

#[derive(Serialize)]
struct ResolveResponse {
    message: String,
    chain: Vec<Block>,
    length: u64,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub blocks_mined: u64,
    pub transactions_submitted: u64,
    pub chains_replaced: u64,
    pub uptime_seconds: u64,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request counting middleware
async fn stats_middleware(State(ctx): State<Arc<ApiContext>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = ctx.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Request logging middleware: method, path, status, duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (also used by tests).
pub fn build_router(ctx: Arc<ApiContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![http::Method::GET, http::Method::POST])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        // Mining
        .route("/mine", get(mine))
        // Transactions
        .route("/transactions/new", post(new_transaction))
        .route("/transactions/pending", get(pending_transactions))
        // Chain
        .route("/chain", get(full_chain))
        // Peers
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        // System
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(ctx.clone(), stats_middleware))
        .with_state(ctx)
        .layer(cors)
}

/// Bind and serve the API.
pub async fn run_api_server(ctx: Arc<ApiContext>, port: u16) -> Result<(), ChainError> {
    let app = build_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChainError::Network(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ChainError::Network(format!("API server failed: {}", e)))
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn mine(State(ctx): State<Arc<ApiContext>>) -> Result<Json<MineResponse>, ApiError> {
    let block = ctx.mine_one().await?;

    Ok(Json(MineResponse {
        message: "New block forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(ctx): State<Arc<ApiContext>>,
    Json(req): Json<NewTransactionRequest>,
) -> Result<Json<NewTransactionResponse>, ApiError> {
    let block_index = {
        let mut guard = ctx.ledger.write().await;
        guard.new_transaction(&req.sender, &req.recipient, req.amount)?
    };

    {
        let mut stats = ctx.api_stats.write().await;
        stats.transactions_submitted += 1;
    }

    Ok(Json(NewTransactionResponse {
        message: format!("Transaction will be added to block {}", block_index),
    }))
}

async fn pending_transactions(State(ctx): State<Arc<ApiContext>>) -> impl IntoResponse {
    let guard = ctx.ledger.read().await;
    Json(serde_json::json!({
        "count": guard.pending().len(),
        "transactions": guard.pending(),
    }))
}

async fn full_chain(State(ctx): State<Arc<ApiContext>>) -> Json<ChainResponse> {
    let guard = ctx.ledger.read().await;
    Json(ChainResponse {
        chain: guard.chain().to_vec(),
        length: guard.len() as u64,
    })
}

async fn list_nodes(State(ctx): State<Arc<ApiContext>>) -> impl IntoResponse {
    let guard = ctx.ledger.read().await;
    let mut peers: Vec<String> = guard.peers().iter().cloned().collect();
    peers.sort();
    Json(serde_json::json!({
        "count": peers.len(),
        "peers": peers,
    }))
}

async fn register_nodes(
    State(ctx): State<Arc<ApiContext>>,
    Json(req): Json<RegisterNodesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.nodes.is_empty() {
        return Err(ApiError::InvalidInput(
            "please supply a non-empty list of nodes".to_string(),
        ));
    }

    // Normalize up front so a bad address rejects the whole request instead
    // of leaving a partially registered list behind.
    for node in &req.nodes {
        crate::peers::normalize_peer(node)?;
    }

    let total_nodes = {
        let mut guard = ctx.ledger.write().await;
        let before = guard.peers().len();
        for node in &req.nodes {
            guard.register_peer(node)?;
        }
        let added = guard.peers().len() - before;

        let mut peers: Vec<String> = guard.peers().iter().cloned().collect();
        peers.sort();
        (added, peers)
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: format!("{} new nodes have been added", total_nodes.0),
            total_nodes: total_nodes.1,
        }),
    ))
}

async fn resolve(State(ctx): State<Arc<ApiContext>>) -> impl IntoResponse {
    let replaced = resolve_conflicts(&ctx.ledger, ctx.peer_client.as_ref()).await;

    if replaced {
        let mut stats = ctx.api_stats.write().await;
        stats.chains_replaced += 1;
    }

    let message = if replaced {
        "Local chain was replaced"
    } else {
        "Local chain is authoritative"
    };

    let guard = ctx.ledger.read().await;
    Json(ResolveResponse {
        message: message.to_string(),
        chain: guard.chain().to_vec(),
        length: guard.len() as u64,
    })
}

async fn health_check(State(ctx): State<Arc<ApiContext>>) -> impl IntoResponse {
    if let Some(state) = &ctx.node_state {
        let state = state.read().await.clone();
        let (status, label) = match state {
            crate::node::NodeState::Ready => (StatusCode::OK, "healthy"),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        };
        let body = serde_json::json!({
            "status": label,
            "node_state": format!("{:?}", state),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    } else {
        Json(serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
        .into_response()
    }
}

async fn get_api_stats(State(ctx): State<Arc<ApiContext>>) -> Json<ApiStatsResponse> {
    let stats = ctx.api_stats.read().await;
    Json(ApiStatsResponse {
        total_requests: stats.total_requests,
        successful_requests: stats.successful_requests,
        failed_requests: stats.failed_requests,
        blocks_mined: stats.blocks_mined,
        transactions_submitted: stats.transactions_submitted,
        chains_replaced: stats.chains_replaced,
        uptime_seconds: stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0),
    })
}
