use super::*;
use crate::crypto::PrivateKey;
use crate::types::{TxOut, GENESIS_TIMESTAMP};

#[test]
fn new_chain_starts_at_the_genesis_block() {
    let chain = Blockchain::new();
    assert_eq!(chain.height(), 1);
    assert_eq!(chain.latest(), &genesis_block());
    assert!(!chain.utxos().is_empty());
}

#[test]
fn mining_at_difficulty_zero_always_succeeds_immediately() {
    let chain = Blockchain::new();
    let cancel = AtomicBool::new(false);
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&reward_address, chain.height(), crate::COINBASE_AMOUNT);

    let mined = Blockchain::find_block(
        chain.height(),
        chain.latest().hash,
        now_secs(),
        vec![coinbase],
        0,
        &cancel,
    );
    assert!(mined.is_some());
}

#[test]
fn mining_stops_promptly_once_cancelled() {
    let cancel = AtomicBool::new(true);
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&reward_address, 1, crate::COINBASE_AMOUNT);
    let mined = Blockchain::find_block(1, Hash::zero(), now_secs(), vec![coinbase], 8, &cancel);
    assert!(mined.is_none());
}

#[test]
fn accept_block_extends_the_chain_and_applies_its_transactions() {
    let mut chain = Blockchain::new();
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&reward_address, chain.height(), crate::COINBASE_AMOUNT);
    let cancel = AtomicBool::new(false);
    let next = Blockchain::find_block(
        chain.height(),
        chain.latest().hash,
        now_secs(),
        vec![coinbase],
        chain.next_difficulty(),
        &cancel,
    )
    .unwrap();

    assert_eq!(chain.accept_block(next), AcceptOutcome::Accepted);
    assert_eq!(chain.height(), 2);
    assert!(!chain.utxos().for_address(&reward_address).is_empty());
}

#[test]
fn accept_block_rejects_a_block_with_the_wrong_previous_hash() {
    let mut chain = Blockchain::new();
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&reward_address, chain.height(), crate::COINBASE_AMOUNT);
    let bogus = Block::new(chain.height(), Hash::of_bytes(b"not the real head"), now_secs(), vec![coinbase], 0, 0);
    assert_eq!(chain.accept_block(bogus), AcceptOutcome::Rejected(NodeError::PrevHashMismatch));
    assert_eq!(chain.height(), 1);
}

#[test]
fn is_valid_new_block_reports_the_specific_check_that_failed() {
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let parent = genesis_block();
    let coinbase = Transaction::coinbase(&reward_address, 1, crate::COINBASE_AMOUNT);

    let wrong_index = Block::new(2, parent.hash, now_secs(), vec![coinbase.clone()], 0, 0);
    assert_eq!(
        Blockchain::is_valid_new_block(&wrong_index, &parent),
        Err(NodeError::IndexMismatch)
    );

    let wrong_prev_hash = Block::new(1, Hash::of_bytes(b"not the parent"), now_secs(), vec![coinbase.clone()], 0, 0);
    assert_eq!(
        Blockchain::is_valid_new_block(&wrong_prev_hash, &parent),
        Err(NodeError::PrevHashMismatch)
    );

    let future_timestamp = Block::new(1, parent.hash, now_secs() + 1_000_000, vec![coinbase.clone()], 0, 0);
    assert_eq!(
        Blockchain::is_valid_new_block(&future_timestamp, &parent),
        Err(NodeError::TimestampOutOfRange)
    );

    let mut tampered_hash = Block::new(1, parent.hash, now_secs(), vec![coinbase.clone()], 0, 0);
    tampered_hash.hash = Hash::of_bytes(b"not the real hash");
    assert_eq!(
        Blockchain::is_valid_new_block(&tampered_hash, &parent),
        Err(NodeError::HashMismatch)
    );

    let unmet_difficulty = Block::new(1, parent.hash, now_secs(), vec![coinbase], 250, 0);
    assert_eq!(
        Blockchain::is_valid_new_block(&unmet_difficulty, &parent),
        Err(NodeError::DifficultyNotMet)
    );
}

#[test]
fn is_valid_chain_rejects_a_chain_with_the_wrong_genesis() {
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let wrong_genesis = Block::new(
        0,
        Hash::zero(),
        GENESIS_TIMESTAMP,
        vec![Transaction::coinbase(&reward_address, 0, crate::COINBASE_AMOUNT)],
        0,
        0,
    );
    assert!(Blockchain::is_valid_chain(&[wrong_genesis]).is_err());
}

#[test]
fn work_of_sums_two_to_the_difficulty() {
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let make = |difficulty: u32| {
        Block::new(0, Hash::zero(), GENESIS_TIMESTAMP, vec![Transaction::coinbase(&reward_address, 0, 50)], difficulty, 0)
    };
    let chain = vec![make(1), make(2)];
    assert_eq!(Blockchain::work_of(&chain), 2 + 4);
}

#[test]
fn replace_chain_keeps_the_current_chain_on_a_tie_or_lower_work() {
    let mut chain = Blockchain::new();
    let same_work = vec![genesis_block()];
    assert_eq!(chain.replace_chain(same_work), ReplaceOutcome::Kept);
    assert_eq!(chain.height(), 1);
}

#[test]
fn replace_chain_rejects_an_internally_invalid_candidate() {
    let mut chain = Blockchain::new();
    let mut bad_genesis = genesis_block();
    bad_genesis.nonce += 1; // invalidates its own hash
    let result = chain.replace_chain(vec![bad_genesis]);
    assert_eq!(result, ReplaceOutcome::Kept);
}

#[test]
fn replace_chain_adopts_a_longer_chain_with_more_work() {
    let mut chain = Blockchain::new();
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let cancel = AtomicBool::new(false);

    let mut candidate = vec![genesis_block()];
    for _ in 0..3 {
        let parent = candidate.last().unwrap().clone();
        let coinbase = Transaction::coinbase(&reward_address, parent.index + 1, crate::COINBASE_AMOUNT);
        let difficulty = expected_difficulty(&candidate);
        let next = Blockchain::find_block(
            parent.index + 1,
            parent.hash,
            now_secs(),
            vec![coinbase],
            difficulty,
            &cancel,
        )
        .unwrap();
        candidate.push(next);
    }

    assert_eq!(chain.replace_chain(candidate.clone()), ReplaceOutcome::Replaced);
    assert_eq!(chain.height(), 4);
    assert_eq!(chain.chain(), candidate);
}

#[test]
fn accept_block_rejects_tampering_with_the_utxo_set_via_a_bad_coinbase_amount() {
    let mut chain = Blockchain::new();
    let reward_address = PrivateKey::new().public_key().to_address_hex();
    let mut coinbase = Transaction::coinbase(&reward_address, chain.height(), crate::COINBASE_AMOUNT);
    coinbase.tx_outs[0] = TxOut { address: reward_address, amount: crate::COINBASE_AMOUNT * 2 };
    coinbase.id = coinbase.compute_id();

    let block = Block::new(chain.height(), chain.latest().hash, now_secs(), vec![coinbase], chain.next_difficulty(), 0);
    assert!(matches!(
        chain.accept_block(block),
        AcceptOutcome::Rejected(NodeError::CoinbaseInvalid(_))
    ));
}
