//! Conflict-resolution scenarios against scripted peers
//!
//! These tests drive `resolve_conflicts` with a stub `PeerClient` so every
//! peer behavior (longer, shorter, invalid, unreachable, misreporting) is
//! exercised deterministically.

use async_trait::async_trait;
use replichain::block::Block;
use replichain::error::{ChainError, Result};
use replichain::ledger::Ledger;
use replichain::sync::{resolve_conflicts, PeerClient, RemoteChain};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Maps normalized peer names to canned responses.
struct ScriptedPeers {
    responses: HashMap<String, Result<RemoteChain>>,
}

impl ScriptedPeers {
    fn new() -> Self {
        ScriptedPeers {
            responses: HashMap::new(),
        }
    }

    fn chain(mut self, peer: &str, chain: Vec<Block>, reported_length: u64) -> Self {
        self.responses.insert(
            peer.to_string(),
            Ok(RemoteChain {
                chain,
                length: reported_length,
            }),
        );
        self
    }

    fn unreachable(mut self, peer: &str) -> Self {
        self.responses.insert(
            peer.to_string(),
            Err(ChainError::Network(format!("{}: connection refused", peer))),
        );
        self
    }
}

#[async_trait]
impl PeerClient for ScriptedPeers {
    async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain> {
        self.responses
            .get(peer)
            .cloned()
            .unwrap_or_else(|| Err(ChainError::Network(format!("{}: unknown peer", peer))))
    }
}

/// A ledger with `extra_blocks` sealed on top of genesis.
fn ledger_of_length(extra_blocks: u64) -> Ledger {
    let mut ledger = Ledger::new("scenario-node", 1);
    for proof in 0..extra_blocks {
        ledger.new_block(proof + 1, "scenario-node", None);
    }
    ledger
}

fn chain_of_length(total_blocks: u64) -> Vec<Block> {
    ledger_of_length(total_blocks - 1).chain().to_vec()
}

fn register(ledger: &mut Ledger, peers: &[&str]) {
    for peer in peers {
        ledger.register_peer(peer).unwrap();
    }
}

#[tokio::test]
async fn longer_valid_peer_chain_is_adopted_wholesale() {
    let mut local = ledger_of_length(0);
    register(&mut local, &["http://peer-a:5000"]);

    let remote = chain_of_length(3);
    let peers = ScriptedPeers::new().chain("peer-a:5000", remote.clone(), 3);

    let ledger = RwLock::new(local);
    let replaced = resolve_conflicts(&ledger, &peers).await;

    assert!(replaced);
    let guard = ledger.read().await;
    assert_eq!(guard.chain(), &remote[..]);
}

#[tokio::test]
async fn invalid_long_chain_and_short_valid_chain_are_both_rejected() {
    // Local length 4; peer A reports 5 but fails linkage; peer B is valid at
    // length 3. Neither wins.
    let mut local = ledger_of_length(3);
    register(
        &mut local,
        &["http://peer-a:5000", "http://peer-b:5000"],
    );
    let before = local.chain().to_vec();

    let mut tampered = chain_of_length(5);
    tampered[2].proof += 1;
    assert!(!Ledger::valid_chain(&tampered));

    let peers = ScriptedPeers::new()
        .chain("peer-a:5000", tampered, 5)
        .chain("peer-b:5000", chain_of_length(3), 3);

    let ledger = RwLock::new(local);
    let replaced = resolve_conflicts(&ledger, &peers).await;

    assert!(!replaced);
    assert_eq!(ledger.read().await.chain(), &before[..]);
}

#[tokio::test]
async fn unreachable_peers_do_not_abort_the_pass() {
    let mut local = ledger_of_length(0);
    register(
        &mut local,
        &["http://peer-down:5000", "http://peer-up:5000"],
    );

    let remote = chain_of_length(4);
    let peers = ScriptedPeers::new()
        .unreachable("peer-down:5000")
        .chain("peer-up:5000", remote.clone(), 4);

    let ledger = RwLock::new(local);
    let replaced = resolve_conflicts(&ledger, &peers).await;

    assert!(replaced);
    assert_eq!(ledger.read().await.len(), 4);
}

#[tokio::test]
async fn equal_length_is_not_replaced() {
    let mut local = ledger_of_length(2);
    register(&mut local, &["http://peer-a:5000"]);
    let before = local.chain().to_vec();

    let peers = ScriptedPeers::new().chain("peer-a:5000", chain_of_length(3), 3);

    let ledger = RwLock::new(local);
    assert!(!resolve_conflicts(&ledger, &peers).await);
    assert_eq!(ledger.read().await.chain(), &before[..]);
}

#[tokio::test]
async fn misreported_length_cannot_shorten_the_chain() {
    // Peer claims length 10 but ships only 2 blocks. The reported number
    // wins the scan, the actual count fails the adoption guard.
    let mut local = ledger_of_length(2);
    register(&mut local, &["http://peer-liar:5000"]);
    let before_len = local.len();

    let peers = ScriptedPeers::new().chain("peer-liar:5000", chain_of_length(2), 10);

    let ledger = RwLock::new(local);
    let replaced = resolve_conflicts(&ledger, &peers).await;

    assert!(!replaced);
    assert!(ledger.read().await.len() >= before_len);
}

#[tokio::test]
async fn resolution_never_shortens_across_many_peers() {
    let mut local = ledger_of_length(2);
    register(
        &mut local,
        &[
            "http://peer-a:5000",
            "http://peer-b:5000",
            "http://peer-c:5000",
        ],
    );
    let before_len = local.len();

    let peers = ScriptedPeers::new()
        .chain("peer-a:5000", chain_of_length(1), 1)
        .unreachable("peer-b:5000")
        .chain("peer-c:5000", chain_of_length(2), 2);

    let ledger = RwLock::new(local);
    let replaced = resolve_conflicts(&ledger, &peers).await;

    assert!(!replaced);
    assert!(ledger.read().await.len() >= before_len);
}

#[tokio::test]
async fn best_candidate_wins_when_several_qualify() {
    let mut local = ledger_of_length(0);
    register(
        &mut local,
        &["http://peer-a:5000", "http://peer-b:5000"],
    );

    let peers = ScriptedPeers::new()
        .chain("peer-a:5000", chain_of_length(3), 3)
        .chain("peer-b:5000", chain_of_length(5), 5);

    let ledger = RwLock::new(local);
    assert!(resolve_conflicts(&ledger, &peers).await);
    // Whichever order the registry iterates in, the longest valid chain is
    // the one adopted.
    assert_eq!(ledger.read().await.len(), 5);
}
