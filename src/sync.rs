//! Peer chain fetching and conflict resolution
//!
//! Consensus is a simplified longest-valid-chain rule: poll every registered
//! peer for its chain, keep the longest candidate that survives structural
//! validation, and adopt it wholesale if it beats the local chain. Peer
//! failures of any kind cost that peer its say for the pass and nothing
//! more.

use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::ledger::Ledger;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default per-peer request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// A peer's chain as reported by its `GET /chain` endpoint.
///
/// Parsed strictly: a block or transaction missing a required field fails
/// deserialization and the peer is discarded for the pass.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChain {
    pub chain: Vec<Block>,
    pub length: u64,
}

/// The fetch-remote-chain collaborator.
///
/// A trait seam so resolution logic can be exercised against scripted peers
/// in tests; production uses [`HttpPeerClient`].
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetch a peer's current chain. `peer` is the normalized
    /// `host[:port][/path]` form from the peer registry.
    async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain>;
}

/// HTTP implementation of [`PeerClient`].
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// A hung peer must not stall a resolution pass, so every request
    /// carries both a connect and an overall timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        HttpPeerClient { http }
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain> {
        let url = format!("http://{}/chain", peer);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChainError::Network(format!(
                "{} responded {}",
                peer,
                response.status()
            )));
        }

        Ok(response.json::<RemoteChain>().await?)
    }
}

/// Longest-valid-chain resolution across all registered peers.
///
/// A peer only becomes the candidate when its reported length strictly
/// exceeds the best length seen so far in this pass AND its chain passes
/// [`Ledger::valid_chain`]; the remote status code is never trusted on its
/// own. Adoption re-checks the candidate's actual block count under the
/// write lock, so the local chain never shortens even against a peer that
/// misreported its length. Returns whether the local chain was replaced.
pub async fn resolve_conflicts<C>(ledger: &RwLock<Ledger>, client: &C) -> bool
where
    C: PeerClient + ?Sized,
{
    let (peers, local_length) = {
        let guard = ledger.read().await;
        let peers: Vec<String> = guard.peers().iter().cloned().collect();
        (peers, guard.len() as u64)
    };

    let mut max_length = local_length;
    let mut candidate: Option<Vec<Block>> = None;

    for peer in &peers {
        let remote = match client.fetch_chain(peer).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(peer = %peer, error = %e, "peer contributed nothing this pass");
                continue;
            }
        };

        if remote.length <= max_length {
            debug!(peer = %peer, length = remote.length, "peer chain is not longer");
            continue;
        }

        if !Ledger::valid_chain(&remote.chain) {
            warn!(peer = %peer, length = remote.length, "peer chain failed validation");
            continue;
        }

        max_length = remote.length;
        candidate = Some(remote.chain);
    }

    if let Some(chain) = candidate {
        let mut guard = ledger.write().await;
        if chain.len() > guard.len() {
            info!(
                old_length = guard.len(),
                new_length = chain.len(),
                "local chain replaced by longer peer chain"
            );
            guard.replace_chain(chain);
            return true;
        }
    }

    false
}
