//! The ledger: hash-linked chain, pending pool, peer registry
//!
//! The chain and the pending pool form one shared resource. Callers that
//! reach a `Ledger` from concurrent tasks must keep it behind a single lock
//! and hold the write guard across any sealing step; the methods here are
//! written so that each one is a complete critical section on its own.

use crate::block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::error::{ChainError, Result};
use crate::peers::normalize_peer;
use crate::pow;
use crate::transaction::Transaction;
use std::collections::HashSet;

pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: HashSet<String>,
    difficulty: u32,
}

impl Ledger {
    /// Create a ledger whose chain holds the fixed genesis block.
    ///
    /// `node_address` is recorded as the genesis miner; the core treats it as
    /// an opaque string.
    pub fn new(node_address: &str, difficulty: u32) -> Self {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
            peers: HashSet::new(),
            difficulty,
        };
        ledger.new_block(
            GENESIS_PROOF,
            node_address,
            Some(GENESIS_PREVIOUS_HASH.to_string()),
        );
        ledger
    }

    /// Seal the pending pool into a new block and append it.
    ///
    /// `previous_hash` is only supplied for the genesis block; afterwards the
    /// link is always computed from the current tip. Snapshotting the pool,
    /// appending the block and clearing the pool happen in one step; there
    /// is no intermediate state where one has happened without the others.
    pub fn new_block(
        &mut self,
        proof: u64,
        miner_address: &str,
        previous_hash: Option<String>,
    ) -> &Block {
        let previous_hash = previous_hash.unwrap_or_else(|| {
            self.chain
                .last()
                .map(Block::hash)
                .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
        });

        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            proof,
            previous_hash,
            transactions: std::mem::take(&mut self.pending),
            miner_address: miner_address.to_string(),
        };

        self.chain.push(block);
        self.chain.last().expect("chain is never empty after push")
    }

    /// Queue a transfer for inclusion in the next mined block.
    ///
    /// Returns the index of the block expected to seal it. Purely
    /// informational: intervening mining (or none at all) can change which
    /// block actually does.
    pub fn new_transaction(&mut self, sender: &str, recipient: &str, amount: u64) -> Result<u64> {
        if sender.is_empty() || recipient.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "sender and recipient are required".to_string(),
            ));
        }

        self.pending.push(Transaction::new(sender, recipient, amount));
        Ok(self.last_block().index + 1)
    }

    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain always holds genesis")
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

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Run the bounded proof search against this ledger's difficulty target.
    pub fn proof_of_work(&self, last_proof: u64, max_attempts: u64) -> Result<u64> {
        pow::proof_of_work(last_proof, self.difficulty, max_attempts)
    }

    /// Is `chain` internally consistent?
    ///
    /// Checks hash linkage only: each block's `previous_hash` must equal the
    /// digest of the block before it. Proofs are not re-verified here. Empty
    /// and single-block chains are trivially valid.
    pub fn valid_chain(chain: &[Block]) -> bool {
        chain
            .windows(2)
            .all(|pair| pair[1].previous_hash == pair[0].hash())
    }

    /// Register a peer by its normalized address.
    ///
    /// Returns whether the peer was new. Equivalent URL spellings collapse
    /// to one entry; reachability is not checked until resolution contacts
    /// the peer.
    pub fn register_peer(&mut self, address: &str) -> Result<bool> {
        let normalized = normalize_peer(address)?;
        Ok(self.peers.insert(normalized))
    }

    pub fn peers(&self) -> &HashSet<String> {
        &self.peers
    }

    /// Replace the whole chain with a peer's. All-or-nothing; the pending
    /// pool is untouched.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }
}
