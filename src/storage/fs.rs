//! Filesystem-backed blob store.
//!
//! Each blob is a file under the root directory at its blob path, with its
//! metadata in a `<file>.meta.json` sidecar.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::{BlobMetadata, BlobStore, StoredBlob, validate_blob_path};

const META_SUFFIX: &str = ".meta.json";

/// Replace `target` with `bytes` via a uniquely named temp file in the same
/// directory. Readers see either the old or the new contents.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}

/// Blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> ServiceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::info!("Blob store at {}", root.display());
        Ok(Self { root })
    }

    fn blob_file(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn meta_file(&self, path: &str) -> PathBuf {
        self.root.join(format!("{path}{META_SUFFIX}"))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, path: &str, bytes: &[u8], metadata: BlobMetadata) -> ServiceResult<()> {
        validate_blob_path(path)?;
        if path.ends_with(META_SUFFIX) {
            return Err(ServiceError::InvalidPath {
                path: path.to_string(),
            });
        }

        let file = self.blob_file(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }

        write_atomic(&file, bytes)?;
        write_atomic(&self.meta_file(path), &serde_json::to_vec(&metadata)?)?;

        log::debug!("Wrote blob {} ({} bytes)", file.display(), bytes.len());
        Ok(())
    }

    fn get(&self, path: &str) -> ServiceResult<Option<StoredBlob>> {
        validate_blob_path(path)?;
        if path.ends_with(META_SUFFIX) {
            return Ok(None);
        }

        let bytes = match fs::read(self.blob_file(path)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let metadata = match fs::read(self.meta_file(path)) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
                log::warn!("Ignoring corrupt metadata for {}: {}", path, err);
                BlobMetadata::default()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BlobMetadata::default(),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(StoredBlob { bytes, metadata }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let meta = BlobMetadata::with_content_type("image/png").custom("width", 64);

        store.put("sessions/x.png", b"\x89PNG", meta.clone()).unwrap();
        let blob = store.get("sessions/x.png").unwrap().unwrap();

        assert_eq!(blob.bytes, b"\x89PNG");
        assert_eq!(blob.metadata, meta);
        assert!(dir.path().join("sessions/x.png").exists());
    }

    #[test]
    fn test_missing_and_sidecar_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put("masks/m.png", b"m", BlobMetadata::default()).unwrap();

        assert!(store.get("masks/none.png").unwrap().is_none());
        assert!(store.get("masks/m.png.meta.json").unwrap().is_none());
        assert!(store.get("../outside").is_err());
    }

    #[test]
    fn test_concurrent_writes_to_one_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 4096]).collect();

        std::thread::scope(|scope| {
            for payload in &payloads {
                let store = &store;
                scope.spawn(move || {
                    store
                        .put("masks/same.png", payload, BlobMetadata::default())
                        .unwrap();
                });
            }
        });

        let blob = store.get("masks/same.png").unwrap().unwrap();
        assert!(payloads.contains(&blob.bytes));

        // Only the blob and its sidecar remain
        let mut names: Vec<String> = fs::read_dir(dir.path().join("masks"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["same.png", "same.png.meta.json"]);
    }
}
