mod block;
mod blockchain;
mod transaction;
mod utxo;

pub use block::{calculate_hash, genesis_block, Block, GENESIS_HASH, GENESIS_REWARD_ADDRESS, GENESIS_TIMESTAMP};
pub use blockchain::{AcceptOutcome, Blockchain, MinedBlock, ReplaceOutcome};
pub use transaction::{compute_transaction_id, process_block_transactions, Transaction, TxIn, TxOut};
pub use utxo::{Utxo, UtxoSet};
