//! Artifact store boundary for trained-model blobs.
//!
//! This crate defines **only** the store trait, its error type, the
//! filesystem and in-memory implementations, and the latest-artifact
//! selector. No model semantics, no registry logic, and no HTTP belong here.

mod error;
mod fs_store;
mod mem_store;
mod select;
mod store;
mod wait;

pub use error::StoreError;
pub use fs_store::FsStore;
pub use mem_store::MemStore;
pub use select::{fetch_artifact, select_latest_key, timestamp_of};
pub use store::ArtifactStore;
pub use wait::wait_for_bucket;
