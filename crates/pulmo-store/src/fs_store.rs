use std::fs;
use std::path::{Path, PathBuf};

use crate::{ArtifactStore, StoreError};

/// Filesystem-backed store: each bucket is a directory under `root`, each
/// key a relative file path inside it. This is the local execution backend;
/// cloud deployments point the same trait at an object-store gateway.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the bucket directory if missing. Idempotent.
    pub fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.root.join(bucket)).map_err(io_err)
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

impl ArtifactStore for FsStore {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        Ok(self.bucket_dir(bucket).is_dir())
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.bucket_dir(bucket);
        if !dir.is_dir() {
            return Err(StoreError::BucketUnavailable {
                bucket: bucket.to_string(),
            });
        }
        let mut keys = Vec::new();
        collect_keys(&dir, &dir, &mut keys)?;
        keys.sort();
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.bucket_dir(bucket).join(key);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        fs::read(&path).map_err(io_err)
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.bucket_dir(bucket).join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&path, bytes).map_err(io_err)
    }
}

/// Recursive walk producing `/`-separated keys relative to `base`.
fn collect_keys(base: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if path.is_dir() {
            collect_keys(base, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(key);
        }
    }
    Ok(())
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}
