use anyhow::{bail, Context, Result};
use pulmo_model::TrainParams;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;

/// The `model:` section of `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Registered model name (e.g. `"pneumonia-rf"`).
    pub name: String,
    /// Class names, index-aligned with label codes.
    pub labels: Vec<String>,
    pub hyperparameters: TrainParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    model: ModelConfig,
}

/// A validated model config plus its canonical-JSON hash.
#[derive(Debug, Clone)]
pub struct LoadedModelConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub model: ModelConfig,
}

/// Load and validate `config.yaml` from disk.
///
/// `model_name_override` (from `PULMO_MODEL_NAME`) replaces the file's name
/// before hashing, so the hash always reflects the effective configuration.
pub fn load_model_config(
    path: &str,
    model_name_override: Option<&str>,
) -> Result<LoadedModelConfig> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read config file: {path}"))?;
    load_model_config_from_str(&raw, model_name_override)
}

pub fn load_model_config_from_str(
    yaml: &str,
    model_name_override: Option<&str>,
) -> Result<LoadedModelConfig> {
    let mut file: ConfigFile = serde_yaml::from_str(yaml).context("invalid config yaml")?;
    if let Some(name) = model_name_override {
        file.model.name = name.to_string();
    }

    if file.model.name.trim().is_empty() {
        bail!("CONFIG_INVALID: model.name is empty");
    }
    if file.model.labels.len() < 2 {
        bail!(
            "CONFIG_INVALID: model.labels needs at least 2 entries, got {}",
            file.model.labels.len()
        );
    }
    let test_size = file.model.hyperparameters.test_size;
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        bail!("CONFIG_INVALID: hyperparameters.test_size {test_size} outside (0, 1)");
    }

    let canonical_json =
        serde_json::to_string(&file).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedModelConfig {
        config_hash,
        canonical_json,
        model: file.model,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
