use crate::error::{NodeError, Result};
use crate::types::{Transaction, UtxoSet};

/// Unconfirmed transactions awaiting inclusion in a block, in insertion
/// order.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `tx` against `utxos`, then rejects it if any of its TxIns
    /// collides with a TxIn already held by the mempool. Otherwise appends it.
    pub fn add(&mut self, tx: Transaction, utxos: &UtxoSet) -> Result<()> {
        tx.validate(utxos)?;
        let incoming = tx.input_refs();
        for existing in &self.transactions {
            if !existing.input_refs().is_disjoint(&incoming) {
                return Err(NodeError::ConflictInMempool);
            }
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Defensive copy.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Drops every transaction with a TxIn referencing a UTXO no longer
    /// present in `utxos`, preserving order among survivors.
    pub fn reconcile(&mut self, utxos: &UtxoSet) {
        self.transactions
            .retain(|tx| tx.tx_ins.iter().all(|tx_in| utxos.contains(&tx_in.tx_out_id, tx_in.tx_out_index)));
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
