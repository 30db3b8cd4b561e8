use std::net::SocketAddr;
use std::sync::Arc;

use btclib::node::Node;
use tokio::net::TcpStream;
use tracing::warn;

use crate::handler::{self, PeerRegistry};

pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// Dials `peer`, registers it with `node`'s peer list, and hands the resulting stream to the same session handler
/// an inbound accept uses.
pub async fn dial(peer: String, node: Arc<Node>, registry: Arc<PeerRegistry>) {
    node.add_peer(peer.clone()).await;
    match TcpStream::connect(&peer).await {
        Ok(stream) => {
            let peer_addr = stream
                .peer_addr()
                .unwrap_or_else(|_| "0.0.0.0:0".parse::<SocketAddr>().expect("valid fallback addr"));
            tokio::spawn(async move {
                handler::handle_connection(stream, peer_addr, node, registry).await;
            });
        }
        Err(e) => warn!("failed to dial {peer}: {e}"),
    }
}
