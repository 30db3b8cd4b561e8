use anyhow::{bail, Context, Result};

use btclib::crypto::PrivateKey;
use btclib::mempool::Mempool;
use btclib::network::Message;
use btclib::types::{Blockchain, Transaction, UtxoSet};
use btclib::wallet::Wallet;
use tokio::net::TcpStream;
use tracing::debug;

/// A thin client over the peer gossip protocol: this wallet
/// borrows the exact wire format peers already use to pull a chain
/// snapshot, derives a UTXO view from it locally, and pushes any
/// transaction it builds back in as a `RESPONSE_TRANSACTION_POOL` message.
/// There is no separate wallet RPC — the HTTP/RPC control surface is
/// explicitly out of scope, so this is the thinnest external
/// client the gossip protocol alone can support.
pub struct Core {
    wallet: Wallet,
    node_address: String,
}

impl Core {
    pub fn new(private_key: PrivateKey, node_address: String) -> Self {
        Core {
            wallet: Wallet::new(private_key),
            node_address,
        }
    }

    pub fn address(&self) -> String {
        self.wallet.address()
    }

    async fn fetch_utxos(&self) -> Result<UtxoSet> {
        let mut stream = TcpStream::connect(&self.node_address)
            .await
            .with_context(|| format!("failed to connect to node at {}", self.node_address))?;
        Message::QueryAll.send_async(&mut stream).await?;
        let response = Message::receive_async(&mut stream).await?;
        let Message::ResponseBlockchain(chain) = response else {
            bail!("node replied to QueryAll with an unexpected message");
        };
        Blockchain::is_valid_chain(&chain).context("node's chain failed validation")
    }

    async fn fetch_mempool_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stream = TcpStream::connect(&self.node_address).await?;
        Message::QueryTransactionPool.send_async(&mut stream).await?;
        let response = Message::receive_async(&mut stream).await?;
        match response {
            Message::ResponseTransactionPool(transactions) => Ok(transactions),
            _ => bail!("node replied to QueryTransactionPool with an unexpected message"),
        }
    }

    pub async fn balance(&self) -> Result<u64> {
        let utxos = self.fetch_utxos().await?;
        Ok(self.wallet.balance(&utxos))
    }

    pub async fn list_unspent(&self) -> Result<Vec<(String, u32, u64)>> {
        let utxos = self.fetch_utxos().await?;
        Ok(utxos
            .for_address(&self.address())
            .into_iter()
            .map(|u| (u.tx_out_id.to_string(), u.tx_out_index, u.amount))
            .collect())
    }

    /// Builds, signs, and submits a transaction paying `amount` to
    /// `recipient`. The mempool view used for coin selection is built by
    /// replaying the node's current pool against the fetched UTXO snapshot;
    /// a transaction the node would itself reject is simply skipped rather
    /// than failing the whole fetch.
    pub async fn send(&self, recipient: &str, amount: u64) -> Result<Transaction> {
        let utxos = self.fetch_utxos().await?;
        let mut mempool = Mempool::new();
        for tx in self.fetch_mempool_transactions().await.unwrap_or_default() {
            let _ = mempool.add(tx, &utxos);
        }

        let tx = self.wallet.build(recipient, amount, &utxos, &mempool)?;

        let mut stream = TcpStream::connect(&self.node_address)
            .await
            .with_context(|| format!("failed to connect to node at {}", self.node_address))?;
        Message::ResponseTransactionPool(vec![tx.clone()])
            .send_async(&mut stream)
            .await
            .context("failed to submit transaction to the node")?;
        debug!("submitted transaction {} to {}", tx.id, self.node_address);
        Ok(tx)
    }
}
