use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{NodeError, Result};
use crate::types::{Block, Transaction};

/// The five-message peer gossip protocol. Each
/// variant carries its own payload; the wire envelope (`WireMessage`) is
/// what's actually serialized, using a `{type, data}` shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    QueryLatest,
    QueryAll,
    ResponseBlockchain(Vec<Block>),
    QueryTransactionPool,
    ResponseTransactionPool(Vec<Transaction>),
}

const QUERY_LATEST: u8 = 0;
const QUERY_ALL: u8 = 1;
const RESPONSE_BLOCKCHAIN: u8 = 2;
const QUERY_TRANSACTION_POOL: u8 = 3;
const RESPONSE_TRANSACTION_POOL: u8 = 4;

/// The literal wire shape: `type` is an integer tag, `data` is a
/// JSON-encoded payload rendered as a string (or absent for the query
/// messages, which carry none).
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: u8,
    data: Option<String>,
}

impl Message {
    fn to_wire(&self) -> Result<WireMessage> {
        let (kind, data) = match self {
            Message::QueryLatest => (QUERY_LATEST, None),
            Message::QueryAll => (QUERY_ALL, None),
            Message::ResponseBlockchain(blocks) => (
                RESPONSE_BLOCKCHAIN,
                Some(serde_json::to_string(blocks).map_err(|e| NodeError::ParseError(e.to_string()))?),
            ),
            Message::QueryTransactionPool => (QUERY_TRANSACTION_POOL, None),
            Message::ResponseTransactionPool(txs) => (
                RESPONSE_TRANSACTION_POOL,
                Some(serde_json::to_string(txs).map_err(|e| NodeError::ParseError(e.to_string()))?),
            ),
        };
        Ok(WireMessage { kind, data })
    }

    fn from_wire(wire: WireMessage) -> Result<Self> {
        match wire.kind {
            QUERY_LATEST => Ok(Message::QueryLatest),
            QUERY_ALL => Ok(Message::QueryAll),
            RESPONSE_BLOCKCHAIN => {
                let data = wire
                    .data
                    .ok_or_else(|| NodeError::ParseError("RESPONSE_BLOCKCHAIN missing data".into()))?;
                let blocks = serde_json::from_str(&data).map_err(|e| NodeError::ParseError(e.to_string()))?;
                Ok(Message::ResponseBlockchain(blocks))
            }
            QUERY_TRANSACTION_POOL => Ok(Message::QueryTransactionPool),
            RESPONSE_TRANSACTION_POOL => {
                let data = wire
                    .data
                    .ok_or_else(|| NodeError::ParseError("RESPONSE_TRANSACTION_POOL missing data".into()))?;
                let txs = serde_json::from_str(&data).map_err(|e| NodeError::ParseError(e.to_string()))?;
                Ok(Message::ResponseTransactionPool(txs))
            }
            other => Err(NodeError::ParseError(format!("unknown message type {other}"))),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = self.to_wire()?;
        serde_json::to_vec(&wire).map_err(|e| NodeError::ParseError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: WireMessage = serde_json::from_slice(bytes).map_err(|e| NodeError::ParseError(e.to_string()))?;
        Self::from_wire(wire)
    }

    /// Writes a length-prefixed JSON frame.
    pub async fn send_async(&self, stream: &mut (impl AsyncWrite + Unpin)) -> Result<()> {
        let bytes = self.encode()?;
        let length = bytes.len() as u64;
        stream
            .write_all(&length.to_be_bytes())
            .await
            .map_err(|e| NodeError::TransportError(e.to_string()))?;
        stream
            .write_all(&bytes)
            .await
            .map_err(|e| NodeError::TransportError(e.to_string()))?;
        Ok(())
    }

    pub async fn receive_async(stream: &mut (impl AsyncRead + Unpin)) -> Result<Self> {
        let mut length_bytes = [0u8; 8];
        stream
            .read_exact(&mut length_bytes)
            .await
            .map_err(|e| NodeError::TransportError(e.to_string()))?;
        let length = u64::from_be_bytes(length_bytes) as usize;

        let mut data = vec![0u8; length];
        stream
            .read_exact(&mut data)
            .await
            .map_err(|e| NodeError::TransportError(e.to_string()))?;
        Self::decode(&data)
    }
}
