use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};
use crate::sha256::Hash;
use crate::types::block::{calculate_hash, genesis_block, Block};
use crate::types::transaction::{process_block_transactions, Transaction};
use crate::types::utxo::UtxoSet;
use crate::util::now_secs;

/// A block one nonce search produced, or `None` if the search was
/// cancelled before finding one.
pub type MinedBlock = Option<Block>;

/// Outcome of `accept_block`. A rejection carries the specific `NodeError`
/// the failing check produced, rather than collapsing every cause to one
/// generic signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    Rejected(NodeError),
}

/// Outcome of `replace_chain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    Kept,
}

/// The block/chain engine: owns the chain sequence and the authoritative
/// UTXO set. Mining is deliberately not a method
/// here beyond pure nonce search (`find_block`) — the node facade runs the
/// search off the mutation lane and only calls back into `accept_block`
/// once a candidate is found.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Blockchain {
    blocks: Vec<Block>,
    utxos: UtxoSet,
}

impl Blockchain {
    pub fn new() -> Self {
        let genesis = genesis_block();
        let utxos = process_block_transactions(&genesis.data, 0, &UtxoSet::new(), crate::COINBASE_AMOUNT)
            .expect("the genesis block is a fixed, always-valid constant");
        Blockchain {
            blocks: vec![genesis],
            utxos,
        }
    }

    pub fn latest(&self) -> &Block {
        self.blocks.last().expect("chain always has at least the genesis block")
    }

    pub fn chain(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn utxos(&self) -> UtxoSet {
        self.utxos.clone()
    }

    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// The difficulty the *next* block (extending the current head) must
    /// satisfy.
    pub fn next_difficulty(&self) -> u32 {
        expected_difficulty(&self.blocks)
    }

    /// Pure, cancelable nonce search. Checked against `cancel` every 4096
    /// nonces so a stale attempt can be abandoned promptly when a new head
    /// is adopted elsewhere.
    pub fn find_block(
        index: u64,
        previous_hash: Hash,
        mut timestamp: u64,
        data: Vec<Transaction>,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> MinedBlock {
        let mut nonce: u64 = 0;
        loop {
            if nonce % 4096 == 0 && cancel.load(Ordering::Relaxed) {
                return None;
            }
            let hash = calculate_hash(index, &previous_hash, timestamp, &data, difficulty, nonce);
            if hash.matches_difficulty(difficulty) {
                return Some(Block {
                    index,
                    previous_hash,
                    timestamp,
                    data,
                    hash,
                    difficulty,
                    nonce,
                });
            }
            match nonce.checked_add(1) {
                Some(next) => nonce = next,
                None => {
                    nonce = 0;
                    timestamp = now_secs();
                }
            }
        }
    }

    /// `isValidNewBlock`: reports the specific check that failed rather
    /// than a bare yes/no, so peer-sourced rejections can be logged and
    /// diagnosed per cause (spec §7).
    pub fn is_valid_new_block(n: &Block, p: &Block) -> Result<()> {
        if n.index != p.index + 1 {
            return Err(NodeError::IndexMismatch);
        }
        if n.previous_hash != p.hash {
            return Err(NodeError::PrevHashMismatch);
        }
        let now = now_secs() as i128;
        let p_ts = p.timestamp as i128;
        let n_ts = n.timestamp as i128;
        if !(p_ts - 60 < n_ts && n_ts - 60 < now) {
            return Err(NodeError::TimestampOutOfRange);
        }
        if !n.hash_is_valid() {
            return Err(NodeError::HashMismatch);
        }
        if !n.satisfies_own_difficulty() {
            return Err(NodeError::DifficultyNotMet);
        }
        Ok(())
    }

    /// `isValidChain`: `cs[0]` must byte-equal the genesis
    /// block; folds `processTransactions` over `cs` from an empty UTXO set,
    /// enforcing block validation for each `i >= 1`.
    pub fn is_valid_chain(candidate: &[Block]) -> Result<UtxoSet> {
        let (genesis, rest) = candidate
            .split_first()
            .ok_or_else(|| NodeError::StructureInvalid("chain is empty".into()))?;
        if *genesis != genesis_block() {
            return Err(NodeError::StructureInvalid(
                "chain does not start with the genesis block".into(),
            ));
        }

        let mut utxos = process_block_transactions(&genesis.data, 0, &UtxoSet::new(), crate::COINBASE_AMOUNT)?;

        for i in 0..rest.len() {
            let n = &rest[i];
            let p = &candidate[i]; // candidate[i] == rest[i - 1], or genesis when i == 0
            Self::is_valid_new_block(n, p)?;
            let expected = expected_difficulty(&candidate[..=i]);
            if n.difficulty != expected {
                return Err(NodeError::DifficultyNotMet);
            }
            utxos = process_block_transactions(&n.data, n.index, &utxos, crate::COINBASE_AMOUNT)?;
        }
        Ok(utxos)
    }

    /// `accept_block`: validates and appends a single block
    /// extending the current head.
    pub fn accept_block(&mut self, block: Block) -> AcceptOutcome {
        let p = self.latest();
        if let Err(e) = Self::is_valid_new_block(&block, p) {
            return AcceptOutcome::Rejected(e);
        }
        if block.difficulty != self.next_difficulty() {
            return AcceptOutcome::Rejected(NodeError::DifficultyNotMet);
        }
        let new_utxos =
            match process_block_transactions(&block.data, block.index, &self.utxos, crate::COINBASE_AMOUNT) {
                Ok(u) => u,
                Err(e) => return AcceptOutcome::Rejected(e),
            };
        self.blocks.push(block);
        self.utxos = new_utxos;
        AcceptOutcome::Accepted
    }

    /// Cumulative work of a chain: `Σ 2^difficulty`.
    pub fn work_of(chain: &[Block]) -> u128 {
        chain.iter().map(|b| 1u128 << b.difficulty.min(127)).sum()
    }

    pub fn work(&self) -> u128 {
        Self::work_of(&self.blocks)
    }

    /// Fork-choice entry point: replaces the
    /// chain only if `candidate` is valid and has strictly greater
    /// cumulative work. Ties keep the current chain.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> ReplaceOutcome {
        let candidate_utxos = match Self::is_valid_chain(&candidate) {
            Ok(u) => u,
            Err(_) => return ReplaceOutcome::Kept,
        };
        if Self::work_of(&candidate) > self.work() {
            self.blocks = candidate;
            self.utxos = candidate_utxos;
            ReplaceOutcome::Replaced
        } else {
            ReplaceOutcome::Kept
        }
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the difficulty the block *after* `chain` (i.e. after
/// `chain.last()`) must satisfy. Always indexes into `chain` itself, never
/// a global singleton, so it gives the right answer both for the node's
/// own chain and for a candidate chain under validation.
fn expected_difficulty(chain: &[Block]) -> u32 {
    let latest = chain.last().expect("chain is never empty");
    let interval = crate::DIFFICULTY_ADJUSTMENT_INTERVAL;
    if latest.index % interval == 0 && latest.index != 0 && chain.len() as u64 > interval {
        let previous_adjustment = &chain[chain.len() - 1 - interval as usize];
        let expected_seconds = crate::BLOCK_GENERATION_INTERVAL * interval;
        let taken_seconds = latest.timestamp.saturating_sub(previous_adjustment.timestamp);
        if taken_seconds < expected_seconds / 2 {
            previous_adjustment.difficulty + 1
        } else if taken_seconds > expected_seconds * 2 {
            previous_adjustment.difficulty.saturating_sub(1)
        } else {
            previous_adjustment.difficulty
        }
    } else {
        latest.difficulty
    }
}

#[cfg(test)]
mod tests;
