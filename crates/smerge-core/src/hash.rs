//! Stable hashing for descriptors and run provenance.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeySpec, SortKey};

    #[test]
    fn key_order_changes_hash() {
        let a: KeySpec = vec![SortKey::asc("a"), SortKey::desc("b")].into();
        let b: KeySpec = vec![SortKey::desc("b"), SortKey::asc("a")].into();
        assert_ne!(hash_serde(&a).unwrap(), hash_serde(&b).unwrap());
        assert_eq!(hash_serde(&a).unwrap(), hash_serde(&a.clone()).unwrap());
        assert_eq!(hash_str("x").to_hex().len(), 64);
    }
}
