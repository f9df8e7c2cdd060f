use minichain_core::{hash::block_hash, pow, Block, Ledger, Mempool};
use minichain_sync::{ChainFetcher, ChainSnapshot, ConsensusResolver, PeerRegistry, SyncError};
use std::collections::HashMap;

/// In-memory stand-in for the HTTP transport; peers absent from the map
/// behave like unreachable nodes.
struct StaticFetcher {
    chains: HashMap<String, ChainSnapshot>,
}

impl ChainFetcher for StaticFetcher {
    async fn fetch_chain(&self, node: &str) -> Result<ChainSnapshot, SyncError> {
        self.chains
            .get(node)
            .cloned()
            .ok_or(SyncError::Status(reqwest::StatusCode::NOT_FOUND))
    }
}

/// A valid chain of `length` blocks built through the full mining round.
fn mined_chain(length: usize) -> Vec<Block> {
    let mut ledger = Ledger::<Mempool>::new();
    while ledger.len() < length {
        let (previous_proof, previous_hash) = {
            let previous = ledger.previous_block();
            (previous.proof, block_hash(previous))
        };
        let proof = pow::solve(previous_proof);
        ledger.create_block(proof, previous_hash);
    }
    ledger.chain().to_vec()
}

fn snapshot(chain: Vec<Block>) -> ChainSnapshot {
    let length = chain.len();
    ChainSnapshot { chain, length }
}

fn registry(addresses: &[&str]) -> PeerRegistry {
    let mut peers = PeerRegistry::new();
    for address in addresses {
        peers.add_node(address).unwrap();
    }
    peers
}

#[tokio::test]
async fn adopts_the_longest_valid_chain() {
    let mut ledger = Ledger::<Mempool>::new();
    ledger.replace_chain(mined_chain(3));

    let mut chains = HashMap::new();
    chains.insert("127.0.0.1:5001".to_string(), snapshot(mined_chain(3)));
    chains.insert("127.0.0.1:5002".to_string(), snapshot(mined_chain(5)));

    let resolver = ConsensusResolver::with_fetcher(StaticFetcher { chains });
    let peers = registry(&["http://127.0.0.1:5001", "http://127.0.0.1:5002"]);

    assert!(resolver.resolve(&mut ledger, &peers).await);
    assert_eq!(ledger.len(), 5);
    assert!(ledger.is_valid());
}

#[tokio::test]
async fn tampered_longer_chain_is_rejected() {
    let mut ledger = Ledger::<Mempool>::new();
    ledger.replace_chain(mined_chain(3));
    let before = ledger.chain().to_vec();

    let mut tampered = mined_chain(5);
    tampered[2].previous_hash = "deadbeef".to_string();

    let mut chains = HashMap::new();
    chains.insert("127.0.0.1:5001".to_string(), snapshot(mined_chain(3)));
    chains.insert("127.0.0.1:5002".to_string(), snapshot(tampered));

    let resolver = ConsensusResolver::with_fetcher(StaticFetcher { chains });
    let peers = registry(&["http://127.0.0.1:5001", "http://127.0.0.1:5002"]);

    assert!(!resolver.resolve(&mut ledger, &peers).await);
    assert_eq!(ledger.chain(), &before[..]);
}

#[tokio::test]
async fn equal_length_chains_never_replace_the_local_one() {
    let mut ledger = Ledger::<Mempool>::new();
    ledger.replace_chain(mined_chain(3));
    let before = ledger.chain().to_vec();

    let mut chains = HashMap::new();
    chains.insert("127.0.0.1:5001".to_string(), snapshot(mined_chain(3)));

    let resolver = ConsensusResolver::with_fetcher(StaticFetcher { chains });
    let peers = registry(&["http://127.0.0.1:5001"]);

    assert!(!resolver.resolve(&mut ledger, &peers).await);
    assert_eq!(ledger.chain(), &before[..]);
}

#[tokio::test]
async fn unreachable_peers_are_skipped() {
    let mut ledger = Ledger::<Mempool>::new();

    let mut chains = HashMap::new();
    chains.insert("127.0.0.1:5002".to_string(), snapshot(mined_chain(4)));

    let resolver = ConsensusResolver::with_fetcher(StaticFetcher { chains });
    // 5001 is registered but never answers.
    let peers = registry(&["http://127.0.0.1:5001", "http://127.0.0.1:5002"]);

    assert!(resolver.resolve(&mut ledger, &peers).await);
    assert_eq!(ledger.len(), 4);
}

#[tokio::test]
async fn no_peers_leaves_the_chain_untouched() {
    let mut ledger = Ledger::<Mempool>::new();
    let resolver = ConsensusResolver::with_fetcher(StaticFetcher {
        chains: HashMap::new(),
    });

    assert!(!resolver.resolve(&mut ledger, &PeerRegistry::new()).await);
    assert_eq!(ledger.len(), 1);
}
