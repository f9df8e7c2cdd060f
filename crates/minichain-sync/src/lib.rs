use minichain_core::{is_chain_valid, Block, Ledger, TransactionPool};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid peer address `{0}`")]
    InvalidAddress(String),
    #[error("peer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("peer answered with status {0}")]
    Status(reqwest::StatusCode),
}

/// The set of known peer authorities (`host:port`).
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    nodes: HashSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the authority of a URL-like address such as
    /// `http://127.0.0.1:5000/`. Duplicate inserts are no-ops.
    pub fn add_node(&mut self, address: &str) -> Result<(), SyncError> {
        let url =
            Url::parse(address).map_err(|_| SyncError::InvalidAddress(address.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| SyncError::InvalidAddress(address.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.nodes.insert(authority);
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Wire shape of a node's `GET /chain` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Transport seam: how the resolver obtains a peer's chain. Tests substitute
/// an in-memory implementation.
pub trait ChainFetcher {
    fn fetch_chain(
        &self,
        node: &str,
    ) -> impl std::future::Future<Output = Result<ChainSnapshot, SyncError>> + Send;
}

#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainFetcher for HttpFetcher {
    async fn fetch_chain(&self, node: &str) -> Result<ChainSnapshot, SyncError> {
        let response = self.client.get(format!("http://{node}/chain")).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// Longest-valid-chain resolution across the registered peers.
#[derive(Clone, Debug, Default)]
pub struct ConsensusResolver<F = HttpFetcher> {
    fetcher: F,
}

impl ConsensusResolver<HttpFetcher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: ChainFetcher> ConsensusResolver<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Visit every peer in turn and adopt the longest strictly-longer valid
    /// chain seen, if any. Returns whether the local chain was replaced.
    ///
    /// Unreachable peers are skipped; equal-length chains never replace the
    /// local one.
    pub async fn resolve<P: TransactionPool>(
        &self,
        ledger: &mut Ledger<P>,
        peers: &PeerRegistry,
    ) -> bool {
        let mut max_length = ledger.len();
        let mut best: Option<Vec<Block>> = None;

        for node in peers.nodes() {
            let snapshot = match self.fetcher.fetch_chain(node).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(%node, error = %err, "skipping peer during consensus");
                    continue;
                }
            };
            if snapshot.length > max_length && is_chain_valid(&snapshot.chain) {
                debug!(%node, length = snapshot.length, "found a longer valid chain");
                max_length = snapshot.length;
                best = Some(snapshot.chain);
            }
        }

        match best {
            Some(chain) => {
                ledger.replace_chain(chain);
                true
            }
            None => false,
        }
    }
}
