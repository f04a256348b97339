//! Model-registry boundary: named models, monotonically versioned entries,
//! and lifecycle stages.
//!
//! The registry itself is an external service; this crate owns the client
//! trait, an HTTP implementation, an in-memory implementation for tests and
//! local runs, and the promotion-transition policy (which version gets the
//! current-serving stage and how predecessors are archived).

mod error;
mod http;
mod mem;
mod publish;
mod registry;
mod types;

pub use error::RegistryError;
pub use http::HttpRegistry;
pub use mem::MemRegistry;
pub use publish::{publish_decision, register_run, PublishOutcome};
pub use registry::ModelRegistry;
pub use types::{RegisteredVersion, RunRecord, Stage, TransitionReport};
