pub mod constants;
pub mod hash;
pub mod pow;

use constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

/// One link of the chain. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Unix seconds at creation. Opaque beyond ordering and display.
    pub timestamp: u64,
    pub proof: u64,
    /// Hex digest of the preceding block, or `"0"` for genesis.
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

/// Capability seam for the pending-transaction pool, so a minimal deployment
/// can run a ledger with no transaction surface at all.
pub trait TransactionPool: Default {
    fn push(&mut self, tx: Transaction);
    fn drain(&mut self) -> Vec<Transaction>;
    fn pending(&self) -> &[Transaction];
}

/// Transactions accepted but not yet embedded in an appended block.
#[derive(Clone, Debug, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl TransactionPool for Mempool {
    fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    fn pending(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// Pool of the transaction-free ledger variant; holds nothing.
#[derive(Clone, Debug, Default)]
pub struct NoPool;

impl TransactionPool for NoPool {
    fn push(&mut self, _tx: Transaction) {}

    fn drain(&mut self) -> Vec<Transaction> {
        Vec::new()
    }

    fn pending(&self) -> &[Transaction] {
        &[]
    }
}

/// The append-only chain plus the pending pool.
///
/// Created once per process and seeded with the genesis block; the only
/// destructive operation is the wholesale swap during consensus resolution.
#[derive(Clone, Debug)]
pub struct Ledger<P: TransactionPool = Mempool> {
    chain: Vec<Block>,
    pool: P,
}

impl<P: TransactionPool> Default for Ledger<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: TransactionPool> Ledger<P> {
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pool: P::default(),
        };
        ledger.create_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    /// Append a block carrying everything currently pending.
    ///
    /// Always succeeds; the pool is cleared atomically as part of the append.
    pub fn create_block(&mut self, proof: u64, previous_hash: String) -> &Block {
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now_secs(),
            proof,
            previous_hash,
            transactions: self.pool.drain(),
        };
        self.chain.push(block);
        self.previous_block()
    }

    pub fn previous_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.chain)
    }

    /// Wholesale swap of the chain. Used only by consensus resolution.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }
}

impl Ledger<Mempool> {
    /// Queue a transaction; returns the index of the block it will land in
    /// once the next block is mined.
    pub fn add_transaction(&mut self, sender: String, receiver: String, amount: u64) -> u64 {
        self.pool.push(Transaction {
            sender,
            receiver,
            amount,
        });
        self.previous_block().index + 1
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.pool.pending()
    }
}

/// Walk adjacent pairs of a candidate chain, checking hash linkage and
/// proof-of-work validity. Never mutates anything.
pub fn is_chain_valid(chain: &[Block]) -> bool {
    if chain.is_empty() {
        return false;
    }
    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if block.previous_hash != hash::block_hash(previous) {
            return false;
        }
        if !pow::verify(previous.proof, block.proof) {
            return false;
        }
    }
    true
}
