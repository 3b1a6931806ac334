use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{validate_key, Blob, BlobStore, StorageError};

/// In-process store used by tests. Keys listed in `fail_deletes` make `delete` error out.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Blob>,
    fail_deletes: Mutex<HashSet<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn fail_delete_of(&self, key: &str) {
        if let Ok(mut keys) = self.fail_deletes.lock() {
            keys.insert(key.to_string());
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs.insert(
            key.to_string(),
            Blob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>, StorageError> {
        validate_key(key)?;
        Ok(self.blobs.get(key).map(|b| b.value().clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let should_fail = self
            .fail_deletes
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(false);
        if should_fail {
            return Err(StorageError::Io(std::io::Error::other(format!(
                "simulated delete failure for {key}"
            ))));
        }
        self.blobs.remove(key);
        Ok(())
    }
}
