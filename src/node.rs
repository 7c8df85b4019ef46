//! Node orchestrator
//!
//! Wires the pieces together: configuration, node identity, the ledger with
//! its genesis block, bootstrap peers, the background resolution loop and
//! the API server.

use crate::api::{run_api_server, ApiContext};
use crate::config::Config;
use crate::error::Result;
use crate::identity::KeyPair;
use crate::ledger::Ledger;
use crate::sync::{resolve_conflicts, HttpPeerClient, PeerClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Syncing,
    Ready,
}

pub struct Node {
    pub config: Config,
    pub address: String,
    pub ledger: Arc<RwLock<Ledger>>,
    pub peer_client: Arc<dyn PeerClient>,
    pub state: Arc<RwLock<NodeState>>,
}

impl Node {
    /// Build a node from configuration: fresh identity, ledger with genesis,
    /// bootstrap peers registered.
    pub fn init(config: Config) -> Result<Arc<Self>> {
        let identity = KeyPair::generate();
        let address = identity.address();
        info!(address = %address, "node identity generated");

        let mut ledger = Ledger::new(&address, config.mining.difficulty);
        for peer in &config.network.bootstrap_peers {
            match ledger.register_peer(peer) {
                Ok(true) => info!(peer = %peer, "bootstrap peer registered"),
                Ok(false) => {}
                Err(e) => warn!(peer = %peer, error = %e, "skipping bootstrap peer"),
            }
        }

        let peer_client: Arc<dyn PeerClient> = Arc::new(HttpPeerClient::with_timeout(
            Duration::from_secs(config.sync.peer_timeout_secs),
        ));

        Ok(Arc::new(Node {
            config,
            address,
            ledger: Arc::new(RwLock::new(ledger)),
            peer_client,
            state: Arc::new(RwLock::new(NodeState::Booting)),
        }))
    }

    /// Run the node: initial resolution pass, periodic resolution loop and
    /// the API server. Returns only when the server stops.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            *state = NodeState::Syncing;
        }

        // Catch up against bootstrap peers before serving.
        let replaced = resolve_conflicts(&self.ledger, self.peer_client.as_ref()).await;
        if replaced {
            info!("adopted a longer chain during startup");
        }

        {
            let mut state = self.state.write().await;
            *state = NodeState::Ready;
        }

        let interval_secs = self.config.sync.resolve_interval_secs;
        if interval_secs > 0 {
            let ledger = self.ledger.clone();
            let client = self.peer_client.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
                // First tick fires immediately; the startup pass covered it.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let replaced = resolve_conflicts(&ledger, client.as_ref()).await;
                    if replaced {
                        info!("periodic resolution replaced the local chain");
                    }
                }
            });
        }

        let ctx = Arc::new(ApiContext::new(
            self.ledger.clone(),
            self.address.clone(),
            self.config.mining.clone(),
            self.peer_client.clone(),
            Some(self.state.clone()),
        ));

        run_api_server(ctx, self.config.network.api_port).await
    }
}
