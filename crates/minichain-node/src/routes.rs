use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use minichain_core::hash::block_hash;
use minichain_core::pow;
use minichain_sync::ChainSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const MINING_REWARD: u64 = 1;
const REWARD_RECEIVER: &str = "miner";

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/mine", get(mine))
        .route("/chain", get(chain))
        .route("/chain/valid", get(validate))
        .route("/transactions", post(submit_transaction))
        .route("/nodes", post(register_nodes))
        .route("/resolve", get(resolve))
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "message": message.into() })))
}

/// Run the full mining round. The proof search is unbounded by construction,
/// so it runs on a blocking worker under an explicit deadline instead of on
/// the serving thread.
async fn mine(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let (previous_proof, previous_index, previous_hash) = {
        let ledger = state.ledger.read().await;
        let previous = ledger.previous_block();
        (previous.proof, previous.index, block_hash(previous))
    };

    let search = tokio::task::spawn_blocking(move || pow::solve(previous_proof));
    let proof = match tokio::time::timeout(state.mine_timeout, search).await {
        Ok(Ok(proof)) => proof,
        Ok(Err(_join)) => {
            return Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "proof search worker failed",
            ))
        }
        Err(_elapsed) => {
            return Err(error(
                StatusCode::SERVICE_UNAVAILABLE,
                "proof search timed out",
            ))
        }
    };

    let mut ledger = state.ledger.write().await;
    if ledger.previous_block().index != previous_index {
        // Someone else appended while we were searching; the proof no longer
        // fits the tip.
        return Err(error(StatusCode::CONFLICT, "chain advanced while mining"));
    }

    ledger.add_transaction(
        state.node_address.clone(),
        REWARD_RECEIVER.to_string(),
        MINING_REWARD,
    );
    let block = ledger.create_block(proof, previous_hash).clone();
    info!(index = block.index, proof = block.proof, "mined a new block");

    Ok(Json(json!({
        "message": "congratulations, you just mined a block",
        "index": block.index,
        "timestamp": block.timestamp,
        "proof": block.proof,
        "previous_hash": block.previous_hash,
        "transactions": block.transactions,
    })))
}

async fn chain(State(state): State<Arc<AppState>>) -> Json<ChainSnapshot> {
    let ledger = state.ledger.read().await;
    Json(ChainSnapshot {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

async fn validate(State(state): State<Arc<AppState>>) -> Json<Value> {
    let valid = state.ledger.read().await.is_valid();
    let message = if valid {
        "all good, the chain is valid"
    } else {
        "the chain is not valid"
    };
    Json(json!({ "valid": valid, "message": message }))
}

#[derive(Debug, Deserialize)]
struct TransactionPayload {
    sender: Option<String>,
    receiver: Option<String>,
    amount: Option<u64>,
}

async fn submit_transaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(sender), Some(receiver), Some(amount)) =
        (payload.sender, payload.receiver, payload.amount)
    else {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "sender, receiver and amount are all required",
        ));
    };

    let index = state.ledger.write().await.add_transaction(sender, receiver, amount);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("transaction will be added to block {index}"),
            "index": index,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct NodesPayload {
    nodes: Vec<String>,
}

async fn register_nodes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NodesPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.nodes.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "no nodes supplied"));
    }

    let mut peers = state.peers.write().await;
    for address in &payload.nodes {
        peers
            .add_node(address)
            .map_err(|err| error(StatusCode::BAD_REQUEST, err.to_string()))?;
    }

    let total_nodes: Vec<String> = peers.nodes().map(str::to_string).collect();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "peers registered",
            "total_nodes": total_nodes,
        })),
    ))
}

async fn resolve(State(state): State<Arc<AppState>>) -> Json<Value> {
    // Snapshot the registry so only the ledger lock is held across the
    // sequential peer round-trips.
    let peers = state.peers.read().await.clone();
    let mut ledger = state.ledger.write().await;
    let replaced = state.resolver.resolve(&mut ledger, &peers).await;
    let message = if replaced {
        "the chain was replaced by the longest valid one"
    } else {
        "the local chain is already the longest"
    };
    Json(json!({
        "message": message,
        "replaced": replaced,
        "chain": ledger.chain(),
    }))
}
