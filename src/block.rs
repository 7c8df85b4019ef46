//! Block structure and canonical hashing

use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Fixed proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// One block in the chain. Immutable once appended.
///
/// The serialized field names are the wire format every node must agree on:
/// `index, timestamp, proof, previous_hash, transactions, miner_address`.
/// All hashing goes through [`Block::canonical_json`]; there is deliberately
/// no second representation of a block anywhere in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Milliseconds since the UNIX epoch at creation.
    pub timestamp: u64,
    /// The winning proof-of-work value.
    pub proof: u64,
    /// Hex digest of the previous block's canonical form, or
    /// [`GENESIS_PREVIOUS_HASH`] for the genesis block.
    pub previous_hash: String,
    /// Snapshot of the pending pool at creation time. May be empty.
    pub transactions: Vec<Transaction>,
    pub miner_address: String,
}

impl Block {
    /// The canonical serialization used as the exact hashing input.
    ///
    /// Round-tripping through `serde_json::Value` sorts object keys (the
    /// default map is ordered by key), so logically equal blocks always
    /// produce byte-identical output regardless of field declaration order.
    pub fn canonical_json(&self) -> String {
        serde_json::to_value(self)
            .expect("block serialization cannot fail")
            .to_string()
    }

    /// SHA-256 hex digest of the canonical form.
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_json().as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_block() -> Block {
        Block {
            index: 1,
            timestamp: 1_600_000_000_000,
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            transactions: vec![],
            miner_address: "miner".to_string(),
        }
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let block = fixed_block();
        assert_eq!(
            block.canonical_json(),
            r#"{"index":1,"miner_address":"miner","previous_hash":"1","proof":100,"timestamp":1600000000000,"transactions":[]}"#
        );
    }

    #[test]
    fn canonical_json_serializes_transactions_recursively() {
        let mut block = fixed_block();
        let mut tx = Transaction::new("alice", "bob", 10);
        tx.initiation_timestamp = 1_600_000_000_500;
        block.transactions.push(tx);

        let json = block.canonical_json();
        assert!(json.contains(r#""transactions":[{"amount":10"#));
        assert!(json.contains(r#""resolved_in":null"#));
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let block = fixed_block();
        let first = block.hash();
        assert_eq!(first.len(), 64);
        assert!(first.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(first, block.hash());
    }

    #[test]
    fn hash_changes_with_content() {
        let block = fixed_block();
        let mut other = block.clone();
        other.proof += 1;
        assert_ne!(block.hash(), other.hash());

        let mut other = block.clone();
        other.transactions.push(Transaction::new("alice", "bob", 1));
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn wire_round_trip_preserves_structure() {
        let mut block = fixed_block();
        block.transactions.push(Transaction::new("alice", "bob", 10));
        block.transactions.push(Transaction::new("bob", "carol", 5));

        let json = serde_json::to_string(&block).unwrap();
        let parsed: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, block);
        assert_eq!(parsed.hash(), block.hash());
    }
}
