//! Scenario: the full train -> store -> register -> promote pipeline against
//! in-memory backends.
//!
//! A separable image dataset (dark frames vs bright frames) trains to high
//! accuracy, the artifact lands under a timestamped key, and registration
//! promotes the new version to current-serving. Low-accuracy and
//! interactive-refusal paths stay experiment-only.

use std::io::Write;

use pulmo_config::EnvConfig;
use pulmo_promotion::{PromoteDecision, ScriptedPrompt};
use pulmo_registry::{MemRegistry, ModelRegistry, PublishOutcome, Stage};
use pulmo_store::{timestamp_of, ArtifactStore, MemStore};
use pulmo_trainer::pipeline;

const CONFIG_YAML: &str = r#"
model:
  name: pneumonia-rf
  labels: [NORMAL, PNEUMONIA]
  hyperparameters:
    n_trees: 10
    max_depth: null
    random_state: 42
    test_size: 0.25
"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn png_bytes(luma: u8) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(64, 64, image::Luma([luma]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// MemStore with both buckets and a cleanly separable labeled dataset.
fn seeded_store() -> MemStore {
    let store = MemStore::new();
    store.create_bucket("datasource");
    store.create_bucket("dev-models");
    for i in 0..8u8 {
        store
            .put(
                "datasource",
                &format!("Normal/img_{i}.png"),
                &png_bytes(15 + i * 4),
            )
            .unwrap();
        store
            .put(
                "datasource",
                &format!("Pneumonia/img_{i}.png"),
                &png_bytes(210 + i * 4),
            )
            .unwrap();
    }
    store
}

fn test_env(auto_promote: bool) -> EnvConfig {
    EnvConfig::from_lookup(|key| {
        Some(
            match key {
                "PULMO_POLL_TIMEOUT_SECS" => "1",
                "PULMO_POLL_INTERVAL_SECS" => "1",
                "PULMO_AUTO_PROMOTE" if auto_promote => "true",
                _ => return None,
            }
            .to_string(),
        )
    })
    .expect("test env is valid")
}

fn config_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    file.write_all(CONFIG_YAML.as_bytes()).expect("write config");
    file
}

// ---------------------------------------------------------------------------
// Train
// ---------------------------------------------------------------------------

#[tokio::test]
async fn train_stores_a_timestamped_artifact() {
    let store = seeded_store();
    let registry = MemRegistry::new();
    let cfg = config_file();

    let out = pipeline::run_train(
        &store,
        &registry,
        &test_env(true),
        cfg.path().to_str().unwrap(),
        false,
        &ScriptedPrompt(None),
    )
    .await
    .expect("train succeeds");

    assert!(out.summary.evaluation.accuracy > 0.9);
    assert!(out.registered.is_none());
    assert!(
        timestamp_of(&out.artifact_key).is_some(),
        "key {} must carry a parseable timestamp",
        out.artifact_key
    );
    assert!(out.artifact_key.ends_with(".bin"));

    let stored = store.get("dev-models", &out.artifact_key).expect("stored");
    assert!(!stored.is_empty());
    // Nothing was registered.
    assert!(registry
        .list_versions("pneumonia-rf")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn train_with_register_promotes_in_one_run() {
    let store = seeded_store();
    let registry = MemRegistry::new();
    let cfg = config_file();

    let out = pipeline::run_train(
        &store,
        &registry,
        &test_env(true),
        cfg.path().to_str().unwrap(),
        true,
        &ScriptedPrompt(None),
    )
    .await
    .expect("train+register succeeds");

    let reg = out.registered.expect("registration ran");
    assert_eq!(reg.decision, PromoteDecision::PromoteToServing);
    assert_eq!(reg.publish, PublishOutcome::Promoted { version: 1 });

    let versions = registry.list_versions("pneumonia-rf").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].stage, Stage::CurrentServing);
}

#[tokio::test]
async fn missing_bucket_aborts_the_run() {
    let store = MemStore::new();
    store.create_bucket("datasource"); // models bucket missing
    let registry = MemRegistry::new();
    let cfg = config_file();

    let err = pipeline::run_train(
        &store,
        &registry,
        &test_env(true),
        cfg.path().to_str().unwrap(),
        false,
        &ScriptedPrompt(None),
    )
    .await
    .expect_err("must abort");
    assert!(err.to_string().contains("BUCKET_UNAVAILABLE"));
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_selects_the_latest_artifact_and_promotes() {
    let store = seeded_store();
    let registry = MemRegistry::new();
    let cfg = config_file();
    let env = test_env(true);

    // A fresh artifact plus an older decoy; the register step must pick
    // the newer key.
    let first = pipeline::run_train(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        false,
        &ScriptedPrompt(None),
    )
    .await
    .unwrap();
    // An older decoy with a smaller timestamp than anything fresh.
    let old_bytes = store.get("dev-models", &first.artifact_key).unwrap();
    store
        .put("dev-models", "model_20200101_000000.bin", &old_bytes)
        .unwrap();

    let out = pipeline::run_register(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        None,
        &ScriptedPrompt(None),
    )
    .await
    .expect("register succeeds");

    assert_eq!(out.artifact_key, first.artifact_key, "latest key wins");
    assert_eq!(out.summary.training_secs, 0.0, "re-evaluation only");
    assert_eq!(out.publish, PublishOutcome::Promoted { version: 1 });
}

#[tokio::test]
async fn interactive_refusal_registers_experiment_only() {
    let store = seeded_store();
    let registry = MemRegistry::new();
    let cfg = config_file();
    let env = test_env(false); // interactive policy

    pipeline::run_train(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        false,
        &ScriptedPrompt(None),
    )
    .await
    .unwrap();

    let out = pipeline::run_register(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        None,
        &ScriptedPrompt(Some("no".to_string())),
    )
    .await
    .expect("register succeeds");

    assert_eq!(out.decision, PromoteDecision::ExperimentOnly);
    assert_eq!(out.publish, PublishOutcome::ExperimentOnly);
    let versions = registry.list_versions("pneumonia-rf").await.unwrap();
    assert_eq!(versions[0].stage, Stage::Experiment);
}

#[tokio::test]
async fn explicit_key_overrides_latest_selection() {
    let store = seeded_store();
    let registry = MemRegistry::new();
    let cfg = config_file();
    let env = test_env(true);

    let first = pipeline::run_train(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        false,
        &ScriptedPrompt(None),
    )
    .await
    .unwrap();
    let old_key = "model_20200101_000000.bin";
    let bytes = store.get("dev-models", &first.artifact_key).unwrap();
    store.put("dev-models", old_key, &bytes).unwrap();

    let out = pipeline::run_register(
        &store,
        &registry,
        &env,
        cfg.path().to_str().unwrap(),
        Some(old_key),
        &ScriptedPrompt(None),
    )
    .await
    .expect("register succeeds");
    assert_eq!(out.artifact_key, old_key);
}

#[tokio::test]
async fn register_with_empty_models_bucket_aborts() {
    let store = seeded_store(); // buckets exist, no artifacts
    let registry = MemRegistry::new();
    let cfg = config_file();

    let err = pipeline::run_register(
        &store,
        &registry,
        &test_env(true),
        cfg.path().to_str().unwrap(),
        None,
        &ScriptedPrompt(None),
    )
    .await
    .expect_err("must abort");
    assert!(err.to_string().contains("NO_ARTIFACTS_FOUND"));
}
