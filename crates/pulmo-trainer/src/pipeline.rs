//! Train and register pipelines.
//!
//! `run_train` produces a timestamped artifact in the models bucket and can
//! chain straight into registration; `run_register` picks a stored artifact
//! (explicit key or latest), re-evaluates it on a held-out split, and applies
//! the promotion decision through the registry publisher. Any selector or
//! publisher error aborts the run.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use pulmo_config::{load_model_config, EnvConfig, LoadedModelConfig};
use pulmo_model::{ModelArtifact, TrainSummary};
use pulmo_promotion::{decide_with, PromoteDecision, PromotionPolicy, PromotionPrompt};
use pulmo_registry::{register_run, ModelRegistry, PublishOutcome, RunRecord};
use pulmo_store::{fetch_artifact, wait_for_bucket, ArtifactStore};
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct TrainOutcome {
    pub artifact_key: String,
    pub summary: TrainSummary,
    /// Present when the run chained into registration.
    pub registered: Option<RegisterOutcome>,
}

#[derive(Debug)]
pub struct RegisterOutcome {
    pub artifact_key: String,
    pub summary: TrainSummary,
    pub decision: PromoteDecision,
    pub publish: PublishOutcome,
}

/// Train a classifier from the datasource bucket and store the artifact
/// under a timestamped key. With `register` set, the fresh artifact is
/// registered in the same run using its training evaluation.
pub async fn run_train(
    store: &dyn ArtifactStore,
    registry: &dyn ModelRegistry,
    env: &EnvConfig,
    config_path: &str,
    register: bool,
    prompt: &dyn PromotionPrompt,
) -> Result<TrainOutcome> {
    wait_for_buckets(store, env).await?;
    let cfg = load_model_config(config_path, env.model_name.as_deref())?;

    let dataset = crate::dataset::load_labeled_features(store, &env.datasource_bucket)?;
    let (artifact, summary) = pulmo_model::train_model(
        &dataset.x,
        &dataset.y,
        &cfg.model.labels,
        &cfg.model.hyperparameters,
    )?;

    let key = format!("model_{}.bin", Utc::now().format("%Y%m%d_%H%M%S"));
    let bytes = artifact.to_bytes()?;
    store
        .put(&env.models_bucket, &key, &bytes)
        .with_context(|| format!("storing artifact {key} failed"))?;
    info!(
        bucket = %env.models_bucket,
        key = %key,
        accuracy = summary.evaluation.accuracy,
        "artifact stored"
    );

    let registered = if register {
        Some(
            register_artifact(
                registry,
                env,
                &cfg,
                key.clone(),
                &bytes,
                summary.clone(),
                prompt,
            )
            .await?,
        )
    } else {
        None
    };

    Ok(TrainOutcome {
        artifact_key: key,
        summary,
        registered,
    })
}

/// Register a stored artifact: explicit key or latest timestamped one.
///
/// The artifact is re-evaluated on a fresh held-out split of the current
/// dataset rather than trusting training-time metrics.
pub async fn run_register(
    store: &dyn ArtifactStore,
    registry: &dyn ModelRegistry,
    env: &EnvConfig,
    config_path: &str,
    explicit_key: Option<&str>,
    prompt: &dyn PromotionPrompt,
) -> Result<RegisterOutcome> {
    wait_for_buckets(store, env).await?;
    let cfg = load_model_config(config_path, env.model_name.as_deref())?;

    let (key, bytes) = fetch_artifact(store, &env.models_bucket, explicit_key)?;
    let artifact = ModelArtifact::from_bytes(&bytes)?;

    let dataset = crate::dataset::load_labeled_features(store, &env.datasource_bucket)?;
    let summary = pulmo_model::evaluate_holdout(
        &artifact,
        &dataset.x,
        &dataset.y,
        cfg.model.hyperparameters.test_size,
        cfg.model.hyperparameters.random_state,
    )?;
    info!(
        key = %key,
        accuracy = summary.evaluation.accuracy,
        "stored artifact re-evaluated"
    );

    register_artifact(registry, env, &cfg, key, &bytes, summary, prompt).await
}

async fn register_artifact(
    registry: &dyn ModelRegistry,
    env: &EnvConfig,
    cfg: &LoadedModelConfig,
    artifact_key: String,
    artifact_bytes: &[u8],
    summary: TrainSummary,
    prompt: &dyn PromotionPrompt,
) -> Result<RegisterOutcome> {
    let policy = PromotionPolicy {
        auto: env.auto_promote,
        ..PromotionPolicy::default()
    };
    let decision = decide_with(&policy, summary.evaluation.accuracy, prompt);

    let run = RunRecord {
        run_id: Uuid::new_v4(),
        environment: env.execution_env.as_str().to_string(),
        config_hash: cfg.config_hash.clone(),
        artifact_key: artifact_key.clone(),
        evaluation: summary.evaluation.clone(),
        train_size: summary.train_size,
        test_size: summary.test_size,
        training_secs: summary.training_secs,
        created_at_utc: Utc::now(),
    };
    let publish = register_run(registry, &cfg.model.name, &run, artifact_bytes, decision)
        .await
        .context("registry publish failed")?;

    Ok(RegisterOutcome {
        artifact_key,
        summary,
        decision,
        publish,
    })
}

async fn wait_for_buckets(store: &dyn ArtifactStore, env: &EnvConfig) -> Result<()> {
    for bucket in [&env.datasource_bucket, &env.models_bucket] {
        if !wait_for_bucket(store, bucket, env.poll_timeout, env.poll_interval).await {
            bail!("BUCKET_UNAVAILABLE: bucket {bucket} not reachable within budget");
        }
    }
    Ok(())
}
