use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::crypto::PrivateKey;
use crate::error::{NodeError, Result};
use crate::mempool::Mempool;
use crate::sha256::Hash;
use crate::types::{AcceptOutcome, Block, Blockchain, ReplaceOutcome, Transaction, Utxo};
use crate::util::now_secs;
use crate::wallet::Wallet;

/// The broadcast capability the chain/mempool side depends on, injected at
/// construction rather than importing the gossip module directly. The peer
/// layer (node binary) implements this over its registered sessions; tests
/// can supply a no-op or recording stub.
pub trait Broadcaster: Send + Sync {
    fn broadcast_latest(&self, block: Block);
    fn broadcast_mempool(&self, transactions: Vec<Transaction>);
}

/// A `Broadcaster` that does nothing, for embedding `Node` where no peer
/// layer is wired up yet.
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn broadcast_latest(&self, _block: Block) {}
    fn broadcast_mempool(&self, _transactions: Vec<Transaction>) {}
}

/// Outcome of processing a peer's chain response, returned so the gossip layer knows whether to
/// follow up with a QUERY_ALL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainResponseAction {
    Ignored,
    Accepted,
    Replaced,
    RequestFullChain,
    Rejected,
}

struct NodeState {
    chain: Blockchain,
    mempool: Mempool,
}

/// Ties the chain engine, mempool, and wallet behind the control-surface
/// commands, under a single mutation lane (here, a `tokio::sync::Mutex`
/// guarding all three) so every mutation is totally ordered.
pub struct Node {
    state: Mutex<NodeState>,
    wallet: Wallet,
    peers: Mutex<Vec<String>>,
    broadcaster: Arc<dyn Broadcaster>,
    mining_cancel: Arc<AtomicBool>,
}

impl Node {
    pub fn new(private_key: PrivateKey, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Node {
            state: Mutex::new(NodeState {
                chain: Blockchain::new(),
                mempool: Mempool::new(),
            }),
            wallet: Wallet::new(private_key),
            peers: Mutex::new(Vec::new()),
            broadcaster,
            mining_cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    // --- control surface -------------------------------------------------

    pub async fn list_chain(&self) -> Vec<Block> {
        self.state.lock().await.chain.chain()
    }

    pub async fn list_peers(&self) -> Vec<String> {
        self.peers.lock().await.clone()
    }

    pub async fn add_peer(&self, url: String) {
        let mut peers = self.peers.lock().await;
        if !peers.contains(&url) {
            peers.push(url);
        }
    }

    pub fn address(&self) -> String {
        self.wallet.address()
    }

    pub async fn balance(&self) -> u64 {
        let state = self.state.lock().await;
        self.wallet.balance(&state.chain.utxos())
    }

    pub async fn list_unspent(&self) -> Vec<Utxo> {
        self.state.lock().await.chain.utxos().all()
    }

    pub async fn list_my_unspent(&self) -> Vec<Utxo> {
        let address = self.address();
        self.state.lock().await.chain.utxos().for_address(&address)
    }

    pub async fn list_mempool(&self) -> Vec<Transaction> {
        self.state.lock().await.mempool.snapshot()
    }

    pub async fn get_block_by_hash(&self, hash: &Hash) -> Option<Block> {
        self.state
            .lock()
            .await
            .chain
            .chain()
            .into_iter()
            .find(|b| b.hash == *hash)
    }

    pub async fn get_transaction_by_id(&self, id: &Hash) -> Option<Transaction> {
        let state = self.state.lock().await;
        if let Some(tx) = state.mempool.snapshot().into_iter().find(|tx| tx.id == *id) {
            return Some(tx);
        }
        state
            .chain
            .chain()
            .into_iter()
            .flat_map(|b| b.data)
            .find(|tx| tx.id == *id)
    }

    pub async fn list_by_address(&self, address: &str) -> Vec<Utxo> {
        self.state.lock().await.chain.utxos().for_address(address)
    }

    /// `mineBlock()`: builds a coinbase plus the current mempool.
    pub async fn mine_block(&self) -> Result<Block> {
        self.mine_with_data(None).await
    }

    /// `mineRawBlock(data)`: arbitrary additional data, only meaningful if
    /// it is itself a valid transaction list.
    pub async fn mine_raw_block(&self, data: Vec<Transaction>) -> Result<Block> {
        self.mine_with_data(Some(data)).await
    }

    /// `mineTransaction(address, amount)`: build+sign+include+mine
    /// atomically.
    pub async fn mine_transaction(&self, address: &str, amount: u64) -> Result<Block> {
        let tx = {
            let state = self.state.lock().await;
            self.wallet.build(address, amount, &state.chain.utxos(), &state.mempool)?
        };
        self.mine_raw_block(vec![tx]).await
    }

    /// `sendTransaction(address, amount)`: build+sign+admit to mempool,
    /// then broadcast it.
    pub async fn send_transaction(&self, address: &str, amount: u64) -> Result<Transaction> {
        let mut state = self.state.lock().await;
        let tx = self.wallet.build(address, amount, &state.chain.utxos(), &state.mempool)?;
        state.mempool.add(tx.clone(), &state.chain.utxos())?;
        let pool = state.mempool.snapshot();
        drop(state);
        self.broadcaster.broadcast_mempool(pool);
        Ok(tx)
    }

    /// `mine_with(data)`: computes the next index, head
    /// hash, and difficulty under the mutation lane, then runs the nonce
    /// search off-lane; on success, re-acquires the lane and commits only
    /// if the search result still extends the (possibly advanced) head.
    async fn mine_with_data(&self, data: Option<Vec<Transaction>>) -> Result<Block> {
        let (index, previous_hash, difficulty, block_data) = {
            let state = self.state.lock().await;
            let latest = state.chain.latest();
            let index = latest.index + 1;
            let coinbase = Transaction::coinbase(&self.address(), index, crate::COINBASE_AMOUNT);
            let mut block_data = vec![coinbase];
            block_data.extend(data.unwrap_or_else(|| state.mempool.snapshot()));
            (index, latest.hash, state.chain.next_difficulty(), block_data)
        };

        self.mining_cancel.store(false, Ordering::Relaxed);
        let cancel = self.mining_cancel.clone();
        let timestamp = now_secs();
        let mined = tokio::task::spawn_blocking(move || {
            Blockchain::find_block(index, previous_hash, timestamp, block_data, difficulty, &cancel)
        })
        .await
        .map_err(|e| NodeError::StructureInvalid(e.to_string()))?;

        let Some(block) = mined else {
            return Err(NodeError::StructureInvalid(
                "mining was cancelled before finding a block".into(),
            ));
        };

        let mut state = self.state.lock().await;
        if state.chain.latest().hash != block.previous_hash {
            // a different head was adopted while we were searching.
            return Err(NodeError::IndexMismatch);
        }
        match state.chain.accept_block(block.clone()) {
            AcceptOutcome::Accepted => {
                let utxos = state.chain.utxos();
                state.mempool.reconcile(&utxos);
                drop(state);
                self.broadcaster.broadcast_latest(block.clone());
                Ok(block)
            }
            AcceptOutcome::Rejected(e) => Err(e),
        }
    }

    /// Cancels any mining attempt currently in flight, so at most one
    /// accepted block per head is ever produced. Called whenever
    /// `handle_chain_response` adopts a new head from a peer, so a stale
    /// local nonce search is interrupted instead of burning CPU to
    /// completion on a chain that no longer extends.
    pub fn cancel_mining(&self) {
        self.mining_cancel.store(true, Ordering::Relaxed);
    }

    // --- gossip entry points ---------------------------------------------

    /// Processes a peer's `RESPONSE_BLOCKCHAIN` payload.
    pub async fn handle_chain_response(&self, received: Vec<Block>) -> ChainResponseAction {
        let Some(last) = received.last() else {
            return ChainResponseAction::Ignored;
        };
        if !last.has_valid_structure() {
            return ChainResponseAction::Ignored;
        }

        let mut state = self.state.lock().await;
        let held = state.chain.latest().clone();
        if last.index <= held.index {
            return ChainResponseAction::Ignored;
        }

        if last.previous_hash == held.hash {
            let candidate = last.clone();
            return match state.chain.accept_block(candidate.clone()) {
                AcceptOutcome::Accepted => {
                    // cancel any in-flight local mining attempt concurrently with
                    // the commit above, so a stale search never outraces this head.
                    self.cancel_mining();
                    let utxos = state.chain.utxos();
                    state.mempool.reconcile(&utxos);
                    drop(state);
                    self.broadcaster.broadcast_latest(candidate);
                    ChainResponseAction::Accepted
                }
                AcceptOutcome::Rejected(_) => ChainResponseAction::Rejected,
            };
        }

        if received.len() == 1 {
            return ChainResponseAction::RequestFullChain;
        }

        match state.chain.replace_chain(received) {
            ReplaceOutcome::Replaced => {
                self.cancel_mining();
                let new_latest = state.chain.latest().clone();
                let utxos = state.chain.utxos();
                state.mempool.reconcile(&utxos);
                drop(state);
                self.broadcaster.broadcast_latest(new_latest);
                ChainResponseAction::Replaced
            }
            ReplaceOutcome::Kept => ChainResponseAction::Rejected,
        }
    }

    /// Processes a peer's `RESPONSE_TRANSACTION_POOL` payload: each
    /// transaction is admitted independently; a failure is silently
    /// skipped. Returns whether any transaction was admitted, so the
    /// caller knows whether to broadcast the updated pool.
    pub async fn handle_transaction_response(&self, transactions: Vec<Transaction>) -> bool {
        let mut state = self.state.lock().await;
        let mut admitted_any = false;
        for tx in transactions {
            let utxos = state.chain.utxos();
            if state.mempool.add(tx, &utxos).is_ok() {
                admitted_any = true;
            }
        }
        if admitted_any {
            let pool = state.mempool.snapshot();
            drop(state);
            self.broadcaster.broadcast_mempool(pool);
        }
        admitted_any
    }
}
