//! In-memory blob store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::{BlobMetadata, BlobStore, StoredBlob, validate_blob_path};

/// Process-local blob store, used for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or_default()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8], metadata: BlobMetadata) -> ServiceResult<()> {
        validate_blob_path(path)?;
        let blob = StoredBlob {
            bytes: bytes.to_vec(),
            metadata,
        };
        self.blobs
            .write()
            .map_err(|_| ServiceError::storage("blob store lock poisoned"))?
            .insert(path.to_string(), blob);
        log::debug!("Stored blob {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    fn get(&self, path: &str) -> ServiceResult<Option<StoredBlob>> {
        validate_blob_path(path)?;
        let blobs = self
            .blobs
            .read()
            .map_err(|_| ServiceError::storage("blob store lock poisoned"))?;
        Ok(blobs.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let store = MemoryBlobStore::new();
        assert!(store.get("masks/a.png").unwrap().is_none());

        store
            .put("masks/a.png", b"one", BlobMetadata::with_content_type("image/png"))
            .unwrap();
        store.put("masks/a.png", b"two", BlobMetadata::default()).unwrap();

        let blob = store.get("masks/a.png").unwrap().unwrap();
        assert_eq!(blob.bytes, b"two");
        assert_eq!(blob.metadata.content_type, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_traversal() {
        let store = MemoryBlobStore::new();
        assert!(store.put("../a.png", b"x", BlobMetadata::default()).is_err());
        assert!(store.get("/a.png").is_err());
    }
}
