mod routes;

use clap::Parser;
use minichain_core::Ledger;
use minichain_sync::{ConsensusResolver, PeerRegistry};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Upper bound on a single proof-of-work search, in seconds
    #[arg(long, default_value_t = 30)]
    mine_timeout: u64,
}

/// Everything a request handler can reach. One ledger and one peer registry
/// per process, all mutation serialized behind the locks.
pub struct AppState {
    ledger: RwLock<Ledger>,
    peers: RwLock<PeerRegistry>,
    resolver: ConsensusResolver,
    /// Per-process address credited as the sender of mining rewards.
    node_address: String,
    mine_timeout: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState {
        ledger: RwLock::new(Ledger::new()),
        peers: RwLock::new(PeerRegistry::new()),
        resolver: ConsensusResolver::new(),
        node_address: Uuid::new_v4().simple().to_string(),
        mine_timeout: Duration::from_secs(args.mine_timeout),
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = args.listen.parse()?;
    info!("minichain node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
