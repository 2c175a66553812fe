use statict_core::{
    AppendError, Appender, DedupError, DedupKey, DedupStorage, DedupValue, Entry, IssuerStorage, IssuerStoreError,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to create storage directory {0}: {1}")]
    CreateDir(PathBuf, io::Error),

    #[error("failed to read existing entries in {0}: {1}")]
    ScanDir(PathBuf, io::Error),
}

/// Durable, file-backed [`DedupStorage`]. Each key is stored as one file
/// named by its hex digest, written with `create_new` so a racing writer
/// observes `AlreadyExists` instead of silently clobbering the first value.
pub struct FileDedupStore {
    dir: PathBuf,
}

impl FileDedupStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FileStoreError::CreateDir(dir.clone(), e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: DedupKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hex()))
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredDedupValue {
    timestamp: u64,
    index: u64,
}

impl DedupStorage for FileDedupStore {
    async fn get(&self, key: DedupKey) -> Result<Option<DedupValue>, DedupError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                let stored: StoredDedupValue = serde_json::from_slice(&bytes)
                    .map_err(|e| DedupError::Backend(format!("corrupt dedup record at {}: {e}", path.display())))?;
                Ok(Some(DedupValue { timestamp: stored.timestamp, index: stored.index }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DedupError::Backend(e.to_string())),
        }
    }

    async fn put(&self, key: DedupKey, value: DedupValue) -> Result<(), DedupError> {
        let path = self.path_for(key);
        let contents = serde_json::to_vec(&StoredDedupValue { timestamp: value.timestamp, index: value.index })
            .expect("a DedupValue always serializes");

        match write_new(&path, &contents) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => match self.get(key).await? {
                Some(existing) if existing == value => Ok(()),
                Some(_) => Err(DedupError::Conflict),
                None => Err(DedupError::Backend(format!("{} exists but is unreadable", path.display()))),
            },
            Err(e) => Err(DedupError::Backend(e.to_string())),
        }
    }
}

/// Durable, content-addressed [`IssuerStorage`]. Certificates are written
/// once under their own SHA-256 fingerprint; a second `put` of the same
/// fingerprint is a no-op regardless of whether the bytes still match (by
/// construction they always do, since the key is collision-resistant).
pub struct FileIssuerStore {
    dir: PathBuf,
}

impl FileIssuerStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FileStoreError::CreateDir(dir.clone(), e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, fingerprint: [u8; 32]) -> PathBuf {
        self.dir.join(format!("{}.der", hex::encode(fingerprint)))
    }
}

impl IssuerStorage for FileIssuerStore {
    async fn exists(&self, fingerprint: [u8; 32]) -> Result<bool, IssuerStoreError> {
        Ok(self.path_for(fingerprint).is_file())
    }

    async fn put(&self, fingerprint: [u8; 32], der: Vec<u8>) -> Result<(), IssuerStoreError> {
        match write_new(&self.path_for(fingerprint), &der) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(IssuerStoreError::Backend(e.to_string())),
        }
    }
}

/// Durable, single-process [`Appender`]: each entry is written as JSON to one
/// file per index under `dir`, named by a zero-padded decimal index so a
/// directory listing sorts in append order. The full entry is persisted,
/// including the issuer-chain fingerprints a real data tile would carry
/// alongside the leaf. Not a substitute for a real tile-based append engine
/// (see the `Appender` trait docs): this backend exists for standalone
/// deployments and local development.
pub struct FileAppender {
    dir: PathBuf,
    next_index: Mutex<u64>,
}

impl FileAppender {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FileStoreError::CreateDir(dir.clone(), e))?;
        let next_index = next_free_index(&dir)?;
        Ok(Self { dir, next_index: Mutex::new(next_index) })
    }

    fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index:020}.leaf"))
    }
}

impl Appender for FileAppender {
    async fn add(&self, entry: Entry) -> Result<u64, AppendError> {
        let index = {
            let mut next = self.next_index.lock().unwrap();
            let index = *next;
            *next += 1;
            index
        };

        let contents = serde_json::to_vec(&entry).map_err(|e| AppendError::Backend(e.to_string()))?;
        fs::write(self.path_for(index), &contents).map_err(|e| AppendError::Backend(e.to_string()))?;
        Ok(index)
    }
}

fn next_free_index(dir: &Path) -> Result<u64, FileStoreError> {
    let mut max_seen = None;
    for entry in fs::read_dir(dir).map_err(|e| FileStoreError::ScanDir(dir.to_path_buf(), e))? {
        let entry = entry.map_err(|e| FileStoreError::ScanDir(dir.to_path_buf(), e))?;
        let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str().map(str::to_string)) else {
            continue;
        };
        if let Ok(index) = stem.parse::<u64>() {
            max_seen = Some(max_seen.map_or(index, |m: u64| m.max(index)));
        }
    }
    Ok(max_seen.map_or(0, |m| m + 1))
}

fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[tokio::test]
    async fn dedup_survives_reopen() {
        let tmp = TempDir::new("statict-dedup").unwrap();
        let key = DedupKey::from_leaf_bytes(b"leaf");
        let value = DedupValue { timestamp: 1, index: 0 };

        {
            let store = FileDedupStore::open(tmp.path()).unwrap();
            store.put(key, value).await.unwrap();
        }

        let reopened = FileDedupStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.get(key).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn dedup_put_rejects_conflicting_value() {
        let tmp = TempDir::new("statict-dedup").unwrap();
        let store = FileDedupStore::open(tmp.path()).unwrap();
        let key = DedupKey::from_leaf_bytes(b"leaf");

        store.put(key, DedupValue { timestamp: 1, index: 0 }).await.unwrap();
        let result = store.put(key, DedupValue { timestamp: 2, index: 1 }).await;
        assert_eq!(result, Err(DedupError::Conflict));
    }

    #[tokio::test]
    async fn issuer_store_is_idempotent_and_content_addressed() {
        let tmp = TempDir::new("statict-issuers").unwrap();
        let store = FileIssuerStore::open(tmp.path()).unwrap();
        let fingerprint = [3u8; 32];

        assert!(!store.exists(fingerprint).await.unwrap());
        store.put(fingerprint, vec![9, 9, 9]).await.unwrap();
        store.put(fingerprint, vec![9, 9, 9]).await.unwrap();
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
    async fn appender_resumes_after_reopen() {
        let tmp = TempDir::new("statict-appender").unwrap();

        {
            let appender = FileAppender::open(tmp.path()).unwrap();
            assert_eq!(appender.add(test_entry(vec![1])).await.unwrap(), 0);
            assert_eq!(appender.add(test_entry(vec![2])).await.unwrap(), 1);
        }

        let reopened = FileAppender::open(tmp.path()).unwrap();
        assert_eq!(reopened.add(test_entry(vec![3])).await.unwrap(), 2);
    }
}
