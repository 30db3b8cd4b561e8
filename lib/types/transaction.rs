use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::crypto::{PrivateKey, Signature};
use crate::error::{NodeError, Result};
use crate::sha256::Hash;
use crate::types::utxo::UtxoSet;

/// A reference to the UTXO being spent, plus the signature binding this
/// spend to the transaction it is a part of. Coinbase
/// inputs carry an empty `tx_out_id` and an empty signature.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxIn {
    pub tx_out_id: Hash,
    pub tx_out_index: u32,
    pub signature: Signature,
}

/// A locked, unspent value: `address` is the 130-character hex-encoded
/// uncompressed public key that can unlock it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    pub address: String,
    pub amount: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Hash,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
}

impl Transaction {
    /// Builds an unsigned coinbase transaction for `block_index`, paying
    /// `reward` to `address`.
    pub fn coinbase(address: &str, block_index: u64, reward: u64) -> Self {
        let tx_ins = vec![TxIn {
            tx_out_id: Hash::zero(),
            tx_out_index: block_index as u32,
            signature: Signature::empty(),
        }];
        let tx_outs = vec![TxOut {
            address: address.to_string(),
            amount: reward,
        }];
        let id = compute_transaction_id(&tx_ins, &tx_outs);
        Transaction { id, tx_ins, tx_outs }
    }

    /// Recomputes the id the way `getTransactionId` does:
    /// the hash of the input references and the outputs, deliberately
    /// excluding signatures so signing can bind to the id.
    pub fn compute_id(&self) -> Hash {
        compute_transaction_id(&self.tx_ins, &self.tx_outs)
    }

    pub fn id_matches(&self) -> bool {
        self.compute_id() == self.id
    }

    /// Signs `tx_ins[index]` in place, given the UTXO snapshot the
    /// transaction spends against. The public key
    /// derived from `private_key` must equal the referenced UTXO's address.
    pub fn sign_input(&mut self, index: usize, private_key: &PrivateKey, utxos: &UtxoSet) -> Result<()> {
        let tx_in = self
            .tx_ins
            .get(index)
            .ok_or_else(|| NodeError::StructureInvalid("tx_in index out of range".into()))?;
        let utxo = utxos
            .get(&tx_in.tx_out_id, tx_in.tx_out_index)
            .ok_or(NodeError::UtxoMissing)?;
        let address = private_key.public_key().to_address_hex();
        if utxo.address != address {
            return Err(NodeError::SignatureInvalid);
        }
        let signature = Signature::sign(self.id.as_bytes(), private_key);
        self.tx_ins[index].signature = signature;
        Ok(())
    }

    /// Validates a non-coinbase transaction against a UTXO snapshot.
    pub fn validate(&self, utxos: &UtxoSet) -> Result<()> {
        if !self.id_matches() {
            return Err(NodeError::TransactionIdMismatch);
        }

        let mut input_sum: u128 = 0;
        for tx_in in &self.tx_ins {
            let utxo = utxos
                .get(&tx_in.tx_out_id, tx_in.tx_out_index)
                .ok_or(NodeError::UtxoMissing)?;
            if !tx_in.signature.verify(self.id.as_bytes(), &utxo.address) {
                return Err(NodeError::SignatureInvalid);
            }
            input_sum += utxo.amount as u128;
        }

        let output_sum: u128 = self.tx_outs.iter().map(|o| o.amount as u128).sum();
        if input_sum != output_sum {
            return Err(NodeError::AmountsUnbalanced);
        }
        Ok(())
    }

    /// Validates the coinbase at `block_index`.
    pub fn validate_coinbase(&self, block_index: u64, reward: u64) -> Result<()> {
        if !self.id_matches() {
            return Err(NodeError::TransactionIdMismatch);
        }
        if self.tx_ins.len() != 1 {
            return Err(NodeError::CoinbaseInvalid(
                "coinbase must have exactly one input".into(),
            ));
        }
        let tx_in = &self.tx_ins[0];
        if !tx_in.signature.is_empty() || tx_in.tx_out_id != Hash::zero() {
            return Err(NodeError::CoinbaseInvalid(
                "coinbase input must have an empty signature and txOutId".into(),
            ));
        }
        if tx_in.tx_out_index as u64 != block_index {
            return Err(NodeError::CoinbaseInvalid(
                "coinbase txOutIndex must equal the block index".into(),
            ));
        }
        if self.tx_outs.len() != 1 {
            return Err(NodeError::CoinbaseInvalid(
                "coinbase must have exactly one output".into(),
            ));
        }
        if self.tx_outs[0].amount != reward {
            return Err(NodeError::CoinbaseInvalid(
                "coinbase output amount must equal the block reward".into(),
            ));
        }
        Ok(())
    }

    /// The `(txOutId, txOutIndex)` pairs this transaction's inputs consume.
    pub fn input_refs(&self) -> HashSet<(Hash, u32)> {
        self.tx_ins
            .iter()
            .map(|tx_in| (tx_in.tx_out_id, tx_in.tx_out_index))
            .collect()
    }
}

/// Validates every transaction of a block and folds the resulting UTXO
/// changes, implementing `processTransactions` end to end:
/// - `transactions[0]` must pass coinbase validation at `block_index`.
/// - no two `TxIn`s across the whole block may reference the same UTXO.
/// - every other transaction must validate against `utxos`.
/// Returns the post-block UTXO set, or the first error encountered.
pub fn process_block_transactions(
    transactions: &[Transaction],
    block_index: u64,
    utxos: &UtxoSet,
    coinbase_reward: u64,
) -> Result<UtxoSet> {
    let (coinbase, rest) = transactions
        .split_first()
        .ok_or_else(|| NodeError::StructureInvalid("block has no transactions".into()))?;
    coinbase.validate_coinbase(block_index, coinbase_reward)?;

    let mut seen_inputs: HashSet<(Hash, u32)> = HashSet::new();
    for tx_in in &coinbase.tx_ins {
        seen_inputs.insert((tx_in.tx_out_id, tx_in.tx_out_index));
    }
    for tx in rest {
        for tx_in in &tx.tx_ins {
            let key = (tx_in.tx_out_id, tx_in.tx_out_index);
            if !seen_inputs.insert(key) {
                return Err(NodeError::DuplicateInputsInBlock);
            }
        }
    }
    for tx in rest {
        tx.validate(utxos)?;
    }

    let mut next = utxos.clone();
    for tx in transactions {
        for tx_in in &tx.tx_ins {
            next.remove(&tx_in.tx_out_id, tx_in.tx_out_index);
        }
    }
    for tx in transactions {
        for (index, tx_out) in tx.tx_outs.iter().enumerate() {
            next.insert(tx.id, index as u32, tx_out.clone());
        }
    }
    Ok(next)
}

/// `getTransactionId`: SHA-256 over the concatenation of every input's
/// `(txOutId, txOutIndex)` followed by every output's `(address, amount)`,
/// each field rendered in decimal/hex text form.
pub fn compute_transaction_id(tx_ins: &[TxIn], tx_outs: &[TxOut]) -> Hash {
    let mut preimage = String::new();
    for tx_in in tx_ins {
        preimage.push_str(&tx_in.tx_out_id.to_hex());
        preimage.push_str(&tx_in.tx_out_index.to_string());
    }
    for tx_out in tx_outs {
        preimage.push_str(&tx_out.address);
        preimage.push_str(&tx_out.amount.to_string());
    }
    Hash::of_bytes(preimage.as_bytes())
}

#[cfg(test)]
mod tests;
