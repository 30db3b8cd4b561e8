use serde::{Deserialize, Serialize};

use crate::sha256::Hash;
use crate::types::transaction::Transaction;

/// Genesis block bytes are a fixed constant every node must agree on: the
/// hash is pinned literally rather than recomputed, matching how every
/// naivecoin-lineage node hard-codes its genesis hash instead of deriving
/// it from `calculate_hash`.
pub const GENESIS_TIMESTAMP: u64 = 1_465_154_705;
pub const GENESIS_REWARD_ADDRESS: &str = "04bfcab8722991ae774db48f934ca79cfb7dd991229153b9f732ac7b6d08ed83ee66b82443f87dd33dbeaca94a1ef1e1dc8a1e5af8d4a1b1a6d1c1e4d10a2b0a70";
pub const GENESIS_HASH: &str = "91a73664bc84c0baa1fc75ea6e4aa6d1d20c5df664c724e3159aefc2e1186627";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub previous_hash: Hash,
    pub timestamp: u64,
    pub data: Vec<Transaction>,
    pub hash: Hash,
    pub difficulty: u32,
    pub nonce: u64,
}

impl Block {
    /// Builds a block from its fields and stamps its hash using the
    /// canonical preimage below.
    pub fn new(
        index: u64,
        previous_hash: Hash,
        timestamp: u64,
        data: Vec<Transaction>,
        difficulty: u32,
        nonce: u64,
    ) -> Self {
        let hash = calculate_hash(index, &previous_hash, timestamp, &data, difficulty, nonce);
        Block {
            index,
            previous_hash,
            timestamp,
            data,
            hash,
            difficulty,
            nonce,
        }
    }

    pub fn recalculate_hash(&self) -> Hash {
        calculate_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.difficulty,
            self.nonce,
        )
    }

    pub fn hash_is_valid(&self) -> bool {
        self.recalculate_hash() == self.hash
    }

    pub fn satisfies_own_difficulty(&self) -> bool {
        self.hash.matches_difficulty(self.difficulty)
    }

    /// `isValidBlockStructure`: static typing already guarantees every
    /// field decodes to the right shape, so the only structural invariant
    /// left to check is the one the type system can't express: a block
    /// must carry at least its coinbase transaction.
    pub fn has_valid_structure(&self) -> bool {
        !self.data.is_empty()
    }
}

/// The pre-image for a block's SHA-256 hash: the concatenation, in order,
/// of decimal index, previousHash, decimal timestamp, `data` (serialized
/// as the JSON array of transactions in their natural field order),
/// decimal difficulty, decimal nonce.
pub fn calculate_hash(
    index: u64,
    previous_hash: &Hash,
    timestamp: u64,
    data: &[Transaction],
    difficulty: u32,
    nonce: u64,
) -> Hash {
    let mut preimage = String::new();
    preimage.push_str(&index.to_string());
    preimage.push_str(&previous_hash.to_hex());
    preimage.push_str(&timestamp.to_string());
    preimage.push_str(&serde_json::to_string(data).expect("transactions always serialize"));
    preimage.push_str(&difficulty.to_string());
    preimage.push_str(&nonce.to_string());
    Hash::of_bytes(preimage.as_bytes())
}

/// Genesis coinbase: defines the chain's initial coins. The block's hash is
/// the network's pinned constant, not a value `calculate_hash` derives --
/// `isValidChain` (see `Blockchain::is_valid_chain`) byte-compares `cs[0]`
/// against exactly this value rather than validating it as a mined block.
pub fn genesis_block() -> Block {
    let genesis_tx = Transaction::coinbase(GENESIS_REWARD_ADDRESS, 0, crate::COINBASE_AMOUNT);
    Block {
        index: 0,
        previous_hash: Hash::zero(),
        timestamp: GENESIS_TIMESTAMP,
        data: vec![genesis_tx],
        hash: GENESIS_HASH.parse().expect("GENESIS_HASH is a well-formed 64-char hex digest"),
        difficulty: 0,
        nonce: 0,
    }
}
