//! Configuration loading: the YAML model config (name, labels,
//! hyperparameters) and the env-driven runtime settings.
//!
//! The model config is canonicalized to JSON and hashed so every run records
//! exactly which configuration produced it; the hash travels with the run
//! metadata into the registry.

mod env;
mod model_cfg;

pub use env::{EnvConfig, ExecutionEnv};
pub use model_cfg::{load_model_config, load_model_config_from_str, LoadedModelConfig, ModelConfig};
