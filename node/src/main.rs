use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use btclib::config::Config;
use btclib::key_provider;
use btclib::node::Node;
use tokio::net::TcpListener;
use tracing::info;

mod handler;
mod util;

use handler::PeerRegistry;

#[derive(FromArgs)]
/// A minimal proof-of-work UTXO node.
struct Args {
    #[argh(option)]
    /// p2p port (defaults to P2P_PORT env var or 6001)
    port: Option<u16>,
    #[argh(positional)]
    /// addresses of peers to dial on startup
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    util::init_tracing();

    let config = Config::global();
    let args: Args = argh::from_env();
    let port = args.port.unwrap_or(config.p2p_port);

    let private_key = key_provider::load_or_generate(&config.private_key_location)
        .context("failed to load or generate the node's private key")?;

    let registry = Arc::new(PeerRegistry::new());
    let node = Arc::new(Node::new(private_key, registry.clone()));

    info!("node address: {}", node.address());

    for peer in &args.peers {
        util::dial(peer.clone(), node.clone(), registry.clone()).await;
    }

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    loop {
        let (socket, peer_addr) = listener.accept().await?;
        let node = node.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            handler::handle_connection(socket, peer_addr, node, registry).await;
        });
    }
}
