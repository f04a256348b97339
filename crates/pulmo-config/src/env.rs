use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where the pipeline is executing. Selects the artifact-store backend
/// wiring; "cloud" expects the store and registry to be remote services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnv {
    Local,
    Cloud,
}

impl ExecutionEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionEnv::Local => "local",
            ExecutionEnv::Cloud => "cloud",
        }
    }
}

/// Runtime settings shared by the trainer and the serving daemon, all
/// env-driven with local-development defaults.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub execution_env: ExecutionEnv,
    pub datasource_bucket: String,
    pub models_bucket: String,
    /// Root directory of the filesystem artifact store.
    pub store_root: String,
    pub registry_url: String,
    /// Override for the model name from config.yaml; also the name the
    /// serving daemon polls for.
    pub model_name: Option<String>,
    /// Stage the serving daemon prefers when picking a version to load
    /// ("current-serving" | "experiment").
    pub serving_stage: String,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub auto_promote: bool,
}

impl EnvConfig {
    /// Read from process environment (`PULMO_*` keys).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Testable constructor: `lookup` plays the role of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let execution_env = match lookup("PULMO_EXECUTION_ENV").as_deref() {
            None | Some("local") => ExecutionEnv::Local,
            Some("cloud") => ExecutionEnv::Cloud,
            Some(other) => bail!("CONFIG_INVALID: PULMO_EXECUTION_ENV={other} (local|cloud)"),
        };

        let serving_stage =
            lookup("PULMO_SERVING_STAGE").unwrap_or_else(|| "current-serving".to_string());
        if !matches!(serving_stage.as_str(), "current-serving" | "experiment") {
            bail!(
                "CONFIG_INVALID: PULMO_SERVING_STAGE={serving_stage} (current-serving|experiment)"
            );
        }

        let poll_timeout_secs = parse_u64(&lookup, "PULMO_POLL_TIMEOUT_SECS", 600)?;
        let poll_interval_secs = parse_u64(&lookup, "PULMO_POLL_INTERVAL_SECS", 10)?;
        if poll_interval_secs == 0 {
            bail!("CONFIG_INVALID: PULMO_POLL_INTERVAL_SECS must be > 0");
        }

        Ok(Self {
            execution_env,
            datasource_bucket: lookup("PULMO_DATASOURCE_BUCKET")
                .unwrap_or_else(|| "datasource".to_string()),
            models_bucket: lookup("PULMO_MODELS_BUCKET")
                .unwrap_or_else(|| "dev-models".to_string()),
            store_root: lookup("PULMO_STORE_ROOT").unwrap_or_else(|| "./store".to_string()),
            registry_url: lookup("PULMO_REGISTRY_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5000".to_string()),
            model_name: lookup("PULMO_MODEL_NAME"),
            serving_stage,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            poll_interval: Duration::from_secs(poll_interval_secs),
            auto_promote: lookup("PULMO_AUTO_PROMOTE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("CONFIG_INVALID: {key}={raw} is not an integer")),
    }
}
