//! pulmo-trainer library target.
//!
//! The train and register pipelines live here so the scenario tests can run
//! them end to end against in-memory backends; `main.rs` only parses the CLI
//! and wires the real ones.

pub mod dataset;
pub mod pipeline;
