pub mod local;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::models::Collection;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug)]
pub enum StorageError {
    InvalidKey(String),
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::InvalidKey(key) => write!(f, "invalid storage key: {key}"),
            StorageError::Io(err) => write!(f, "storage io error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

/// Named-path object store for uploaded attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &str;
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Option<Blob>, StorageError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys are relative, slash separated, and never climb out of the store root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

pub fn object_key(
    collection: Collection,
    submission_id: Uuid,
    attachment_id: Uuid,
    filename: &str,
) -> String {
    format!(
        "{}/{submission_id}/{attachment_id}-{}",
        collection.as_str(),
        sanitize_filename(filename)
    )
}

/// Reduce a client supplied filename to `[A-Za-z0-9._-]`, keeping the extension readable.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.chars().take(120).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\proof of payment.pdf"), "proof_of_payment.pdf");
        assert_eq!(sanitize_filename("...hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn object_key_is_scoped_by_collection_and_submission() {
        let sid = Uuid::nil();
        let aid = Uuid::nil();
        let key = object_key(Collection::Donations, sid, aid, "receipt.png");
        assert_eq!(key, format!("donations/{sid}/{aid}-receipt.png"));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("../secret").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
    }
}
