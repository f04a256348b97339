use crate::StoreError;

/// Blob-store contract: list / get / put byte blobs keyed by name inside a
/// named bucket.
///
/// Implementations must be object-safe (`Box<dyn ArtifactStore>`) and
/// `Send + Sync` so the training pipeline can hold them across task
/// boundaries. Keys may contain `/` separators; buckets are flat namespaces.
pub trait ArtifactStore: Send + Sync {
    /// Human-readable name identifying this backend (e.g. `"fs"`).
    fn name(&self) -> &'static str;

    /// True when the bucket exists and is reachable.
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    /// List all keys in `bucket` starting with `prefix` (`""` lists all).
    ///
    /// Returns keys in a stable backend-defined order; callers must not
    /// assume chronological ordering.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch the bytes stored under `key`.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Store `bytes` under `key`, overwriting any previous value.
    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}
