use std::fmt;

/// Errors an [`crate::ArtifactStore`] implementation or the selector may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An explicitly requested key does not exist in the bucket.
    NotFound { bucket: String, key: String },
    /// The bucket holds no key matching the `model_<YYYYMMDD>_<HHMMSS>` pattern.
    NoArtifactsFound { bucket: String },
    /// The bucket itself is missing or not yet reachable.
    BucketUnavailable { bucket: String },
    /// Underlying I/O or transport failure.
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { bucket, key } => {
                write!(f, "NOT_FOUND: key {key} missing in bucket {bucket}")
            }
            StoreError::NoArtifactsFound { bucket } => {
                write!(f, "NO_ARTIFACTS_FOUND: no model artifacts in bucket {bucket}")
            }
            StoreError::BucketUnavailable { bucket } => {
                write!(f, "BUCKET_UNAVAILABLE: bucket {bucket} not reachable")
            }
            StoreError::Io(msg) => write!(f, "store io error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
