use std::collections::HashSet;

use crate::crypto::{PrivateKey, Signature};
use crate::error::{NodeError, Result};
use crate::mempool::Mempool;
use crate::sha256::Hash;
use crate::types::{Transaction, TxIn, TxOut, UtxoSet};

/// A single-key wallet: builds and signs transactions against a given
/// UTXO snapshot plus mempool view, with no I/O of its own beyond the key
/// it was constructed with. The key itself comes from the
/// key provider, not from here.
pub struct Wallet {
    private_key: PrivateKey,
}

impl Wallet {
    pub fn new(private_key: PrivateKey) -> Self {
        Wallet { private_key }
    }

    /// The derived public key, 130-char hex, "04"-prefixed.
    pub fn address(&self) -> String {
        self.private_key.public_key().to_address_hex()
    }

    /// Sum of amounts of UTXOs in `utxos` owned by this wallet.
    pub fn balance(&self, utxos: &UtxoSet) -> u64 {
        utxos.for_address(&self.address()).iter().map(|u| u.amount).sum()
    }

    /// Builds, signs, and returns a transaction paying `amount` to
    /// `receiver`: candidate inputs are this
    /// wallet's UTXOs in `utxos` minus those already referenced by
    /// `mempool`, greedily selected in `utxos`' iteration order until
    /// their sum covers `amount`.
    pub fn build(
        &self,
        receiver: &str,
        amount: u64,
        utxos: &UtxoSet,
        mempool: &Mempool,
    ) -> Result<Transaction> {
        let address = self.address();
        let reserved: HashSet<(Hash, u32)> = mempool
            .snapshot()
            .iter()
            .flat_map(|tx| tx.input_refs())
            .collect();

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in utxos.for_address(&address) {
            if reserved.contains(&(utxo.tx_out_id, utxo.tx_out_index)) {
                continue;
            }
            total += utxo.amount;
            selected.push(utxo);
            if total >= amount {
                break;
            }
        }
        if total < amount {
            return Err(NodeError::InsufficientFunds);
        }

        let tx_ins: Vec<TxIn> = selected
            .iter()
            .map(|u| TxIn {
                tx_out_id: u.tx_out_id,
                tx_out_index: u.tx_out_index,
                signature: Signature::empty(),
            })
            .collect();

        let mut tx_outs = vec![TxOut {
            address: receiver.to_string(),
            amount,
        }];
        let change = total - amount;
        if change > 0 {
            tx_outs.push(TxOut {
                address: address.clone(),
                amount: change,
            });
        }

        let mut tx = Transaction {
            id: Hash::zero(),
            tx_ins,
            tx_outs,
        };
        tx.id = tx.compute_id();
        for index in 0..tx.tx_ins.len() {
            tx.sign_input(index, &self.private_key, utxos)?;
        }
        Ok(tx)
    }
}
