//! Blob storage for source images and masks.
//!
//! Blobs are addressed by a relative slash-separated path such as
//! `sessions/{id}.png`. Each blob carries HTTP metadata that is replayed
//! when it is served back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub(crate) use fs::write_atomic;
pub use memory::MemoryBlobStore;

/// HTTP metadata stored alongside a blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    /// Content-Type to serve the blob with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Cache-Control to serve the blob with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    /// Free-form string metadata (e.g. image width/height)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl BlobMetadata {
    /// Metadata with a content type.
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    /// Set the cache control.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Add a custom metadata entry.
    pub fn custom(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.custom.insert(key.into(), value.to_string());
        self
    }
}

/// A blob read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub metadata: BlobMetadata,
}

impl StoredBlob {
    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Object storage keyed by path.
pub trait BlobStore: Send + Sync {
    /// Write (or overwrite) the blob at `path`.
    fn put(&self, path: &str, bytes: &[u8], metadata: BlobMetadata) -> ServiceResult<()>;

    /// Read the blob at `path`, None if nothing is stored there.
    fn get(&self, path: &str) -> ServiceResult<Option<StoredBlob>>;
}

/// Check that `path` is a relative, non-escaping blob path.
///
/// Rejects empty paths, absolute paths, backslashes and `.`/`..`/empty
/// segments.
pub fn validate_blob_path(path: &str) -> ServiceResult<()> {
    let invalid = || ServiceError::InvalidPath {
        path: path.to_string(),
    };

    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(invalid());
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(())
}
