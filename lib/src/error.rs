use thiserror::Error;

/// Every failure mode the consensus and transaction state machine can
/// surface. Peer-sourced errors are confined to the offending message by the
/// caller (see `node/src/handler.rs`); internal invariant violations (the
/// UTXO set disagreeing with a fold over the chain) are not represented
/// here and panic instead, since they indicate an implementation bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("malformed message or block: {0}")]
    StructureInvalid(String),
    #[error("block index does not extend the expected parent")]
    IndexMismatch,
    #[error("block previousHash does not match parent hash")]
    PrevHashMismatch,
    #[error("block timestamp outside the allowed tolerance window")]
    TimestampOutOfRange,
    #[error("recomputed hash does not match the declared block hash")]
    HashMismatch,
    #[error("block hash does not satisfy the declared difficulty")]
    DifficultyNotMet,
    #[error("recomputed transaction id does not match the declared id")]
    TransactionIdMismatch,
    #[error("signature does not verify against the referenced UTXO's address")]
    SignatureInvalid,
    #[error("referenced UTXO is not present in the UTXO set")]
    UtxoMissing,
    #[error("sum of input amounts does not equal sum of output amounts")]
    AmountsUnbalanced,
    #[error("coinbase transaction is malformed: {0}")]
    CoinbaseInvalid(String),
    #[error("two transaction inputs in the same block reference the same UTXO")]
    DuplicateInputsInBlock,
    #[error("mempool transaction conflicts with an existing mempool transaction")]
    ConflictInMempool,
    #[error("wallet does not hold enough unspent value to cover this amount")]
    InsufficientFunds,
    #[error("address is not a 130-character \"04\"-prefixed hex string")]
    AddressInvalid,
    #[error("peer transport error: {0}")]
    TransportError(String),
    #[error("failed to parse a wire message: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
