use sha2::{Digest, Sha256};
use std::future::Future;
use thiserror::Error;

/// A deterministic fingerprint of an entry's canonical leaf bytes,
/// independent of submission timestamp. See [`crate::entry::CanonicalLeaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey([u8; 32]);

impl DedupKey {
    pub fn from_leaf_bytes(leaf_bytes: &[u8]) -> Self {
        Self(Sha256::digest(leaf_bytes).into())
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for DedupKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// What a successful dedup hit returns: the SCT fields of the first
/// submission of this entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupValue {
    pub timestamp: u64,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DedupError {
    #[error("a different entry is already recorded under this dedup key")]
    Conflict,

    #[error("dedup backend error: {0}")]
    Backend(String),
}

/// Storage for the dedup index keyed by [`DedupKey`]. Implementations must be
/// safe for concurrent `put` calls racing on the same key: the loser of a
/// race returns [`DedupError::Conflict`] rather than silently overwriting.
pub trait DedupStorage: Send + Sync {
    fn get(
        &self,
        key: DedupKey,
    ) -> impl Future<Output = Result<Option<DedupValue>, DedupError>> + Send;

    fn put(
        &self,
        key: DedupKey,
        value: DedupValue,
    ) -> impl Future<Output = Result<(), DedupError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_produce_same_key() {
        let a = DedupKey::from_leaf_bytes(b"entry-one");
        let b = DedupKey::from_leaf_bytes(b"entry-one");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_produce_different_keys() {
        let a = DedupKey::from_leaf_bytes(b"entry-one");
        let b = DedupKey::from_leaf_bytes(b"entry-two");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_round_trips_through_distinct_strings() {
        let a = DedupKey::from_leaf_bytes(b"entry-one").to_hex();
        let b = DedupKey::from_leaf_bytes(b"entry-two").to_hex();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
