use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use btclib::network::Message;
use btclib::node::{Broadcaster, ChainResponseAction, Node};
use btclib::types::{Block, Transaction};
use dashmap::DashMap;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

/// Every live peer session, keyed by its remote address. Each session owns an
/// unbounded channel; a dedicated writer task drains it so one slow peer
/// serializes only its own writes.
#[derive(Default)]
pub struct PeerRegistry {
    sessions: DashMap<String, mpsc::UnboundedSender<Message>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: String, tx: mpsc::UnboundedSender<Message>) {
        self.sessions.insert(id, tx);
    }

    fn deregister(&self, id: &str) {
        self.sessions.remove(id);
    }
}

impl Broadcaster for PeerRegistry {
    /// Fans the new head out to every registered session: best-effort, fire-and-forget. A session whose channel
    /// is gone (peer already closed) is simply skipped; its own read loop
    /// will have deregistered it already.
    fn broadcast_latest(&self, block: Block) {
        let message = Message::ResponseBlockchain(vec![block]);
        for session in self.sessions.iter() {
            let _ = session.value().send(message.clone());
        }
    }

    fn broadcast_mempool(&self, transactions: Vec<Transaction>) {
        let message = Message::ResponseTransactionPool(transactions);
        for session in self.sessions.iter() {
            let _ = session.value().send(message.clone());
        }
    }
}

/// Runs one peer session end to end,
/// whether it came from an inbound accept or an outbound dial.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    node: Arc<Node>,
    registry: Arc<PeerRegistry>,
) {
    let id = peer_addr.to_string();
    let (mut reader, mut writer) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    registry.register(id.clone(), tx.clone());

    let writer_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if message.send_async(&mut writer).await.is_err() {
                break;
            }
        }
    });

    if tx.send(Message::QueryLatest).is_err() {
        registry.deregister(&id);
        writer_task.abort();
        return;
    }

    // The 500 ms deferred mempool query is the session's only timer; if
    // the session has already closed by the time it fires, the send into
    // a removed channel is simply dropped.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            let _ = tx.send(Message::QueryTransactionPool);
        });
    }

    loop {
        let message = match Message::receive_async(&mut reader).await {
            Ok(message) => message,
            Err(e) => {
                debug!("peer {id} disconnected: {e}");
                break;
            }
        };

        match message {
            Message::QueryLatest => {
                if let Some(latest) = node.list_chain().await.pop() {
                    let _ = tx.send(Message::ResponseBlockchain(vec![latest]));
                }
            }
            Message::QueryAll => {
                let _ = tx.send(Message::ResponseBlockchain(node.list_chain().await));
            }
            Message::ResponseBlockchain(blocks) => match node.handle_chain_response(blocks).await {
                ChainResponseAction::RequestFullChain => {
                    let _ = tx.send(Message::QueryAll);
                }
                ChainResponseAction::Accepted | ChainResponseAction::Replaced => {
                    info!("adopted a new head received from {id}");
                }
                ChainResponseAction::Ignored | ChainResponseAction::Rejected => {}
            },
            Message::QueryTransactionPool => {
                let _ = tx.send(Message::ResponseTransactionPool(node.list_mempool().await));
            }
            Message::ResponseTransactionPool(transactions) => {
                node.handle_transaction_response(transactions).await;
            }
        }
    }

    registry.deregister(&id);
    writer_task.abort();
}
