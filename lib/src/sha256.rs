use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};

/// A SHA-256 digest, rendered as 64 lowercase hex characters on the wire.
/// This type hashes a caller-supplied byte preimage directly rather than
/// the serialized form of an arbitrary value, so block and transaction ids
/// can be pinned to an exact, cross-implementation-stable concatenation.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Hash(#[serde(with = "hash_hex")] [u8; 32]);

impl Hash {
    pub fn of_bytes(preimage: &[u8]) -> Self {
        let digest = sha256::digest(preimage);
        let bytes = hex::decode(digest).expect("sha256::digest always returns valid hex");
        let array: [u8; 32] = bytes.as_slice().try_into().expect("sha256 digest is 32 bytes");
        Hash(array)
    }

    pub fn zero() -> Self {
        Hash([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of leading zero bits in the binary expansion of the hash,
    /// used by `is_valid_new_block`/`accept_block` to check a block's hash
    /// against its declared difficulty.
    pub fn leading_zero_bits(&self) -> u32 {
        let mut count = 0u32;
        for byte in self.0 {
            if byte == 0 {
                count += 8;
                continue;
            }
            count += byte.leading_zeros();
            break;
        }
        count
    }

    pub fn matches_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_bits() >= difficulty
    }
}

impl FromStr for Hash {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| NodeError::StructureInvalid(format!("invalid hash hex: {e}")))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| NodeError::StructureInvalid("hash must be 32 bytes".into()))?;
        Ok(Hash(array))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

mod hash_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("hash must decode to exactly 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_hash_the_same() {
        assert_eq!(Hash::of_bytes(b"hello"), Hash::of_bytes(b"hello"));
    }

    #[test]
    fn different_bytes_hash_differently() {
        assert_ne!(Hash::of_bytes(b"hello"), Hash::of_bytes(b"world"));
    }

    #[test]
    fn zero_hash_has_256_leading_zero_bits() {
        assert_eq!(Hash::zero().leading_zero_bits(), 256);
        assert!(Hash::zero().matches_difficulty(20));
    }

    #[test]
    fn hex_round_trips() {
        let hash = Hash::of_bytes(b"round trip me");
        let text = hash.to_hex();
        assert_eq!(text.parse::<Hash>().unwrap(), hash);
    }

    #[test]
    fn display_matches_to_hex() {
        let hash = Hash::of_bytes(b"display");
        assert_eq!(format!("{hash}"), hash.to_hex());
    }
}
