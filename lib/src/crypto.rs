use ecdsa::signature::{rand_core::OsRng, Signer, Verifier};
use ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::Secp256k1;
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};

/// A DER-encoded, hex-rendered secp256k1 signature.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Signature(pub String);

impl Signature {
    pub fn sign(message: &[u8], private_key: &PrivateKey) -> Self {
        let signature: EcdsaSignature<Secp256k1> = private_key.0.sign(message);
        Signature(hex::encode(signature.to_der().as_bytes()))
    }

    pub fn verify(&self, message: &[u8], address: &str) -> bool {
        let Ok(public_key) = PublicKey::from_address_hex(address) else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(&self.0) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::<Secp256k1>::from_der(&sig_bytes) else {
            return false;
        };
        public_key.0.verify(message, &signature).is_ok()
    }

    /// The empty signature a coinbase TxIn carries.
    pub fn empty() -> Self {
        Signature(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey<Secp256k1>);

impl PublicKey {
    /// Uncompressed point, hex-encoded: 130 characters, "04" prefix.
    pub fn to_address_hex(&self) -> String {
        hex::encode(self.0.to_encoded_point(false).as_bytes())
    }

    pub fn from_address_hex(address: &str) -> Result<Self> {
        if !is_well_formed_address(address) {
            return Err(NodeError::AddressInvalid);
        }
        let bytes = hex::decode(address).map_err(|_| NodeError::AddressInvalid)?;
        let point =
            k256::EncodedPoint::from_bytes(&bytes).map_err(|_| NodeError::AddressInvalid)?;
        let key = VerifyingKey::from_encoded_point(&point).map_err(|_| NodeError::AddressInvalid)?;
        Ok(PublicKey(key))
    }
}

/// A valid address is a 130-character hex string, all hex digits, starting
/// with "04". Checked independently of point-decoding so
/// callers can reject malformed addresses before touching curve math.
pub fn is_well_formed_address(address: &str) -> bool {
    address.len() == 130
        && address.starts_with("04")
        && address.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Clone)]
pub struct PrivateKey(SigningKey<Secp256k1>);

impl PrivateKey {
    pub fn new() -> Self {
        PrivateKey(SigningKey::random(&mut OsRng))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| NodeError::StructureInvalid(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| NodeError::StructureInvalid("not a valid secp256k1 scalar".into()))?;
        Ok(PrivateKey(key))
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
