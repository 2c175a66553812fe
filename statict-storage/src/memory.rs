use statict_core::{
    AppendError, Appender, DedupError, DedupKey, DedupStorage, DedupValue, Entry, IssuerStorage, IssuerStoreError,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::RwLock,
};

/// Non-persistent [`DedupStorage`]. Useful for tests and ephemeral
/// deployments where losing the dedup index on restart is acceptable.
#[derive(Debug, Default)]
pub struct MemoryDedupStore(RwLock<HashMap<DedupKey, DedupValue>>);

impl DedupStorage for MemoryDedupStore {
    async fn get(&self, key: DedupKey) -> Result<Option<DedupValue>, DedupError> {
        Ok(self.0.read().unwrap().get(&key).copied())
    }

    async fn put(&self, key: DedupKey, value: DedupValue) -> Result<(), DedupError> {
        let mut map = self.0.write().unwrap();
        match map.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(DedupError::Conflict),
            None => {
                map.insert(key, value);
                Ok(())
            }
        }
    }
}

/// Non-persistent [`IssuerStorage`].
#[derive(Debug, Default)]
pub struct MemoryIssuerStore(RwLock<HashSet<[u8; 32]>>);

impl IssuerStorage for MemoryIssuerStore {
    async fn exists(&self, fingerprint: [u8; 32]) -> Result<bool, IssuerStoreError> {
        Ok(self.0.read().unwrap().contains(&fingerprint))
    }

    async fn put(&self, fingerprint: [u8; 32], _der: Vec<u8>) -> Result<(), IssuerStoreError> {
        self.0.write().unwrap().insert(fingerprint);
        Ok(())
    }
}

/// Non-persistent [`Appender`]: assigns indices by insertion order, holding
/// each entry in memory. Suitable for tests; a real deployment's appender
/// lives in front of tile storage and is out of this crate's scope.
#[derive(Debug, Default)]
pub struct MemoryAppender(RwLock<BTreeMap<u64, Entry>>);

impl Appender for MemoryAppender {
    async fn add(&self, entry: Entry) -> Result<u64, AppendError> {
        let mut log = self.0.write().unwrap();
        let index = log.len() as u64;
        log.insert(index, entry);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dedup_put_is_idempotent_for_equal_values() {
        let store = MemoryDedupStore::default();
        let key = DedupKey::from_leaf_bytes(b"leaf");
        let value = DedupValue { timestamp: 1, index: 0 };

        store.put(key, value).await.unwrap();
        store.put(key, value).await.unwrap();
        assert_eq!(store.get(key).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn dedup_put_rejects_conflicting_value() {
        let store = MemoryDedupStore::default();
        let key = DedupKey::from_leaf_bytes(b"leaf");
        store.put(key, DedupValue { timestamp: 1, index: 0 }).await.unwrap();

        let result = store.put(key, DedupValue { timestamp: 1, index: 1 }).await;
        assert_eq!(result, Err(DedupError::Conflict));
    }

    #[tokio::test]
    async fn issuer_store_put_is_idempotent() {
        let store = MemoryIssuerStore::default();
        let fingerprint = [7u8; 32];
        assert!(!store.exists(fingerprint).await.unwrap());

        store.put(fingerprint, vec![1, 2, 3]).await.unwrap();
        store.put(fingerprint, vec![1, 2, 3]).await.unwrap();
        assert!(store.exists(fingerprint).await.unwrap());
    }

    fn test_entry(leaf_certificate: Vec<u8>) -> Entry {
        Entry {
            is_precert: false,
            timestamp: 0,
            leaf_certificate,
            issuer_key_hash: None,
            issuer_chain_hashes: vec![],
        }
    }

    #[tokio::test]
    async fn appender_assigns_sequential_indices() {
        let appender = MemoryAppender::default();
        assert_eq!(appender.add(test_entry(vec![1])).await.unwrap(), 0);
        assert_eq!(appender.add(test_entry(vec![2])).await.unwrap(), 1);
        assert_eq!(appender.add(test_entry(vec![3])).await.unwrap(), 2);
    }
}
