use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::sha256::Hash;
use crate::types::transaction::TxOut;

/// A `TxOut` identified by the transaction and index that produced it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    pub tx_out_id: Hash,
    pub tx_out_index: u32,
    pub address: String,
    pub amount: u64,
}

/// The authoritative ledger: every unspent output, unique by
/// `(tx_out_id, tx_out_index)`. Read operations (`get`, `for_address`)
/// borrow; `process_block_transactions` clones the set and applies a
/// block's consumed/produced outputs, so `is_valid_chain` can fold from
/// an empty set and compare rather than mutating shared state in place.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UtxoSet {
    entries: HashMap<(Hash, u32), TxOut>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tx_out_id: &Hash, tx_out_index: u32) -> Option<&TxOut> {
        self.entries.get(&(*tx_out_id, tx_out_index))
    }

    pub fn contains(&self, tx_out_id: &Hash, tx_out_index: u32) -> bool {
        self.entries.contains_key(&(*tx_out_id, tx_out_index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, tx_out_id: Hash, tx_out_index: u32, tx_out: TxOut) {
        self.entries.insert((tx_out_id, tx_out_index), tx_out);
    }

    pub fn remove(&mut self, tx_out_id: &Hash, tx_out_index: u32) {
        self.entries.remove(&(*tx_out_id, tx_out_index));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Hash, u32), &TxOut)> {
        self.entries.iter()
    }

    /// All UTXOs locked to `address`, in an arbitrary but stable iteration
    /// order; the wallet's coin selection walks this order when picking
    /// inputs for a new transaction.
    pub fn for_address(&self, address: &str) -> Vec<Utxo> {
        self.entries
            .iter()
            .filter(|((_, _), tx_out)| tx_out.address == address)
            .map(|((tx_out_id, tx_out_index), tx_out)| Utxo {
                tx_out_id: *tx_out_id,
                tx_out_index: *tx_out_index,
                address: tx_out.address.clone(),
                amount: tx_out.amount,
            })
            .collect()
    }

    pub fn all(&self) -> Vec<Utxo> {
        self.entries
            .iter()
            .map(|((tx_out_id, tx_out_index), tx_out)| Utxo {
                tx_out_id: *tx_out_id,
                tx_out_index: *tx_out_index,
                address: tx_out.address.clone(),
                amount: tx_out.amount,
            })
            .collect()
    }
}
