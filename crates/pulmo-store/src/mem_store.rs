use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::{ArtifactStore, StoreError};

/// In-memory store used by tests and local single-process runs.
///
/// Listing order is key-sorted (BTreeMap), which keeps the selector's
/// tie-break deterministic across runs.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    buckets: BTreeSet<String>,
    blobs: BTreeMap<(String, String), Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, bucket: &str) {
        let mut inner = self.inner.lock().expect("mem store poisoned");
        inner.buckets.insert(bucket.to_string());
    }
}

impl ArtifactStore for MemStore {
    fn name(&self) -> &'static str {
        "mem"
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().expect("mem store poisoned");
        Ok(inner.buckets.contains(bucket))
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().expect("mem store poisoned");
        if !inner.buckets.contains(bucket) {
            return Err(StoreError::BucketUnavailable {
                bucket: bucket.to_string(),
            });
        }
        Ok(inner
            .blobs
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.inner.lock().expect("mem store poisoned");
        inner
            .blobs
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("mem store poisoned");
        inner.buckets.insert(bucket.to_string());
        inner
            .blobs
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }
}
