#![forbid(unsafe_code)]
//! Replichain node binary: serve the ledger API and keep it in sync with peers.

use clap::Parser;
use replichain::config::load_config;
use replichain::node::Node;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "replichain-node")]
#[command(about = "Run a replicated proof-of-work ledger node")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override the API port from the configuration
    #[arg(long)]
    port: Option<u16>,

    /// Additional peers to register at startup (host:port or full URL)
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(port) = args.port {
        config.network.api_port = port;
    }
    config.network.bootstrap_peers.extend(args.peers);

    let node = Node::init(config)?;
    node.start().await?;
    Ok(())
}
