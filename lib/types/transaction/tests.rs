use super::*;
use crate::crypto::PrivateKey;

fn fund(utxos: &mut UtxoSet, address: &str, amount: u64) -> Hash {
    let id = Hash::of_bytes(format!("{address}{amount}").as_bytes());
    utxos.insert(id, 0, TxOut { address: address.to_string(), amount });
    id
}

#[test]
fn coinbase_id_matches_and_validates() {
    let key = PrivateKey::new();
    let address = key.public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&address, 7, 50);
    assert!(coinbase.id_matches());
    assert!(coinbase.validate_coinbase(7, 50).is_ok());
}

#[test]
fn coinbase_rejects_the_wrong_block_index() {
    let key = PrivateKey::new();
    let address = key.public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&address, 7, 50);
    assert_eq!(
        coinbase.validate_coinbase(8, 50),
        Err(NodeError::CoinbaseInvalid(
            "coinbase txOutIndex must equal the block index".into()
        ))
    );
}

#[test]
fn coinbase_rejects_the_wrong_reward() {
    let key = PrivateKey::new();
    let address = key.public_key().to_address_hex();
    let coinbase = Transaction::coinbase(&address, 0, 50);
    assert!(coinbase.validate_coinbase(0, 25).is_err());
}

#[test]
fn sign_and_validate_a_spend_round_trips() {
    let sender = PrivateKey::new();
    let sender_address = sender.public_key().to_address_hex();
    let receiver_address = PrivateKey::new().public_key().to_address_hex();

    let mut utxos = UtxoSet::new();
    let spent = fund(&mut utxos, &sender_address, 100);

    let mut tx = Transaction {
        id: Hash::zero(),
        tx_ins: vec![TxIn {
            tx_out_id: spent,
            tx_out_index: 0,
            signature: Signature::empty(),
        }],
        tx_outs: vec![TxOut {
            address: receiver_address,
            amount: 100,
        }],
    };
    tx.id = tx.compute_id();
    tx.sign_input(0, &sender, &utxos).unwrap();

    assert!(tx.validate(&utxos).is_ok());
}

#[test]
fn validate_rejects_a_tampered_id() {
    let sender = PrivateKey::new();
    let sender_address = sender.public_key().to_address_hex();
    let mut utxos = UtxoSet::new();
    let spent = fund(&mut utxos, &sender_address, 100);

    let mut tx = Transaction {
        id: Hash::zero(),
        tx_ins: vec![TxIn {
            tx_out_id: spent,
            tx_out_index: 0,
            signature: Signature::empty(),
        }],
        tx_outs: vec![TxOut {
            address: sender_address,
            amount: 100,
        }],
    };
    tx.id = tx.compute_id();
    tx.sign_input(0, &sender, &utxos).unwrap();
    tx.id = Hash::of_bytes(b"not the real id");

    assert_eq!(tx.validate(&utxos), Err(NodeError::TransactionIdMismatch));
}

#[test]
fn validate_rejects_unbalanced_amounts() {
    let sender = PrivateKey::new();
    let sender_address = sender.public_key().to_address_hex();
    let mut utxos = UtxoSet::new();
    let spent = fund(&mut utxos, &sender_address, 100);

    let mut tx = Transaction {
        id: Hash::zero(),
        tx_ins: vec![TxIn {
            tx_out_id: spent,
            tx_out_index: 0,
            signature: Signature::empty(),
        }],
        tx_outs: vec![TxOut {
            address: sender_address,
            amount: 40,
        }],
    };
    tx.id = tx.compute_id();
    tx.sign_input(0, &sender, &utxos).unwrap();

    assert_eq!(tx.validate(&utxos), Err(NodeError::AmountsUnbalanced));
}

#[test]
fn validate_rejects_a_missing_utxo() {
    let sender = PrivateKey::new();
    let utxos = UtxoSet::new();
    let mut tx = Transaction {
        id: Hash::zero(),
        tx_ins: vec![TxIn {
            tx_out_id: Hash::of_bytes(b"nonexistent"),
            tx_out_index: 0,
            signature: Signature::empty(),
        }],
        tx_outs: vec![TxOut {
            address: sender.public_key().to_address_hex(),
            amount: 1,
        }],
    };
    tx.id = tx.compute_id();
    assert_eq!(tx.validate(&utxos), Err(NodeError::UtxoMissing));
}

#[test]
fn process_block_transactions_rejects_duplicate_inputs_across_the_block() {
    let sender = PrivateKey::new();
    let sender_address = sender.public_key().to_address_hex();
    let mut utxos = UtxoSet::new();
    let spent = fund(&mut utxos, &sender_address, 100);

    let make_spend = || {
        let mut tx = Transaction {
            id: Hash::zero(),
            tx_ins: vec![TxIn {
                tx_out_id: spent,
                tx_out_index: 0,
                signature: Signature::empty(),
            }],
            tx_outs: vec![TxOut {
                address: sender_address.clone(),
                amount: 100,
            }],
        };
        tx.id = tx.compute_id();
        tx.sign_input(0, &sender, &utxos).unwrap();
        tx
    };
    let first = make_spend();
    let second = make_spend();

    let coinbase = Transaction::coinbase(&sender_address, 1, 50);
    let result = process_block_transactions(&[coinbase, first, second], 1, &utxos, 50);
    assert_eq!(result, Err(NodeError::DuplicateInputsInBlock));
}

#[test]
fn process_block_transactions_updates_the_utxo_set() {
    let sender = PrivateKey::new();
    let sender_address = sender.public_key().to_address_hex();
    let receiver_address = PrivateKey::new().public_key().to_address_hex();
    let mut utxos = UtxoSet::new();
    let spent = fund(&mut utxos, &sender_address, 100);

    let mut spend = Transaction {
        id: Hash::zero(),
        tx_ins: vec![TxIn {
            tx_out_id: spent,
            tx_out_index: 0,
            signature: Signature::empty(),
        }],
        tx_outs: vec![TxOut {
            address: receiver_address.clone(),
            amount: 100,
        }],
    };
    spend.id = spend.compute_id();
    spend.sign_input(0, &sender, &utxos).unwrap();

    let coinbase = Transaction::coinbase(&sender_address, 1, 50);
    let next = process_block_transactions(&[coinbase.clone(), spend.clone()], 1, &utxos, 50).unwrap();

    assert!(next.get(&spent, 0).is_none());
    assert_eq!(next.get(&spend.id, 0).unwrap().address, receiver_address);
    assert_eq!(next.get(&coinbase.id, 0).unwrap().amount, 50);
}

#[test]
fn input_refs_collects_every_spent_output() {
    let tx = Transaction {
        id: Hash::zero(),
        tx_ins: vec![
            TxIn { tx_out_id: Hash::of_bytes(b"a"), tx_out_index: 0, signature: Signature::empty() },
            TxIn { tx_out_id: Hash::of_bytes(b"b"), tx_out_index: 1, signature: Signature::empty() },
        ],
        tx_outs: vec![],
    };
    let refs = tx.input_refs();
    assert_eq!(refs.len(), 2);
    assert!(refs.contains(&(Hash::of_bytes(b"a"), 0)));
}
