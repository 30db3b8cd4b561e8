use crate::crypto::{is_well_formed_address, PrivateKey, Signature};

#[test]
fn public_key_derivation_is_deterministic() {
    let private_key = PrivateKey::new();
    assert_eq!(private_key.public_key(), private_key.public_key());
}

#[test]
fn address_is_130_hex_chars_prefixed_with_04() {
    let address = PrivateKey::new().public_key().to_address_hex();
    assert_eq!(address.len(), 130);
    assert!(address.starts_with("04"));
    assert!(is_well_formed_address(&address));
}

#[test]
fn address_round_trips_through_hex() {
    let public_key = PrivateKey::new().public_key();
    let address = public_key.to_address_hex();
    let parsed = crate::crypto::PublicKey::from_address_hex(&address).unwrap();
    assert_eq!(parsed, public_key);
}

#[test]
fn signature_verifies_under_the_signing_key() {
    let private_key = PrivateKey::new();
    let address = private_key.public_key().to_address_hex();
    let message = b"transaction id bytes";

    let signature = Signature::sign(message, &private_key);
    assert!(signature.verify(message, &address));
}

#[test]
fn signature_fails_for_a_different_message() {
    let private_key = PrivateKey::new();
    let address = private_key.public_key().to_address_hex();

    let signature = Signature::sign(b"message one", &private_key);
    assert!(!signature.verify(b"message two", &address));
}

#[test]
fn signature_fails_for_a_different_key() {
    let signer = PrivateKey::new();
    let other = PrivateKey::new().public_key().to_address_hex();
    let message = b"transaction id bytes";

    let signature = Signature::sign(message, &signer);
    assert!(!signature.verify(message, &other));
}

#[test]
fn private_key_hex_round_trips() {
    let private_key = PrivateKey::new();
    let hex = private_key.to_hex();
    let reloaded = PrivateKey::from_hex(&hex).unwrap();
    assert_eq!(private_key.public_key(), reloaded.public_key());
}

#[test]
fn malformed_addresses_are_rejected() {
    assert!(!is_well_formed_address("not-hex"));
    assert!(!is_well_formed_address("04aa"));
    assert!(!is_well_formed_address(&"05".to_string().repeat(65)));
}
