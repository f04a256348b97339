//! pulmo-serve library target.
//!
//! Exposes the router, state, and loader for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod loader;
pub mod routes;
pub mod state;
