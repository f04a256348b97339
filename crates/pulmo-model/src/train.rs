use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifierParameters;
use smartcore::model_selection::train_test_split;
use tracing::info;

use crate::artifact::{to_matrix, Forest, ModelArtifact};
use crate::metrics::{evaluate_predictions, EvaluationResult};
use crate::ARTIFACT_SCHEMA_VERSION;

/// Hyperparameters for one training run. Sourced from the model config file;
/// defaults match it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainParams {
    pub n_trees: u16,
    pub max_depth: Option<u16>,
    /// Seed for both the train/test shuffle and the forest itself. Required
    /// so runs are reproducible.
    pub random_state: u64,
    /// Fraction of samples held out for evaluation.
    pub test_size: f32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            random_state: 42,
            test_size: 0.2,
        }
    }
}

/// Metrics and bookkeeping from one training run, recorded with the
/// registered version for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSummary {
    pub evaluation: EvaluationResult,
    pub train_size: usize,
    pub test_size: usize,
    pub training_secs: f64,
}

/// Train a random forest on `(x, y)` and evaluate it on a held-out split.
///
/// `labels[i]` names class code `i`. Fails when the dataset is empty or the
/// label codes exceed the label list.
pub fn train_model(
    x: &[Vec<f64>],
    y: &[u32],
    labels: &[String],
    params: &TrainParams,
) -> Result<(ModelArtifact, TrainSummary)> {
    if x.is_empty() || x.len() != y.len() {
        bail!(
            "DATASET_INVALID: {} feature rows vs {} labels",
            x.len(),
            y.len()
        );
    }
    if let Some(&max_code) = y.iter().max() {
        if max_code as usize >= labels.len() {
            bail!(
                "DATASET_INVALID: label code {} out of range for {} class names",
                max_code,
                labels.len()
            );
        }
    }

    let matrix = to_matrix(x)?;
    let targets: Vec<u32> = y.to_vec();
    let (x_train, x_test, y_train, y_test) = train_test_split(
        &matrix,
        &targets,
        params.test_size,
        true,
        Some(params.random_state),
    );

    let mut forest_params = RandomForestClassifierParameters::default()
        .with_n_trees(params.n_trees)
        .with_seed(params.random_state);
    if let Some(depth) = params.max_depth {
        forest_params = forest_params.with_max_depth(depth);
    }

    let train_size = y_train.len();
    let test_size = y_test.len();
    info!(train_size, test_size, n_trees = params.n_trees, "fitting random forest");

    let started = Instant::now();
    let forest: Forest = Forest::fit(&x_train, &y_train, forest_params)
        .map_err(|e| anyhow!("classifier fit failed: {e}"))?;
    let training_secs = started.elapsed().as_secs_f64();

    let y_pred = forest
        .predict(&x_test)
        .map_err(|e| anyhow!("classifier predict failed: {e}"))?;
    let evaluation = evaluate_predictions(labels, &y_test, &y_pred);
    info!(
        accuracy = evaluation.accuracy,
        training_secs, "training complete"
    );

    let artifact = ModelArtifact {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        labels: labels.to_vec(),
        feature_len: x[0].len(),
        trained_at_utc: Utc::now(),
        forest,
    };
    let summary = TrainSummary {
        evaluation,
        train_size,
        test_size,
        training_secs,
    };
    Ok((artifact, summary))
}

/// Evaluate an already-trained artifact on a fresh held-out split of `(x, y)`.
///
/// Used by the register pipeline, which re-evaluates the stored artifact
/// rather than trusting metrics computed at training time. `training_secs`
/// in the returned summary is zero since nothing was fitted here.
pub fn evaluate_holdout(
    artifact: &ModelArtifact,
    x: &[Vec<f64>],
    y: &[u32],
    test_size: f32,
    seed: u64,
) -> Result<TrainSummary> {
    if x.is_empty() || x.len() != y.len() {
        bail!(
            "DATASET_INVALID: {} feature rows vs {} labels",
            x.len(),
            y.len()
        );
    }
    let matrix = to_matrix(x)?;
    if x[0].len() != artifact.feature_len {
        bail!(
            "FEATURE_COUNT_MISMATCH: got {} features, model expects {}",
            x[0].len(),
            artifact.feature_len
        );
    }
    let targets: Vec<u32> = y.to_vec();
    let (_x_train, x_test, _y_train, y_test) =
        train_test_split(&matrix, &targets, test_size, true, Some(seed));

    let y_pred = artifact
        .forest
        .predict(&x_test)
        .map_err(|e| anyhow!("classifier predict failed: {e}"))?;
    let evaluation = evaluate_predictions(&artifact.labels, &y_test, &y_pred);
    Ok(TrainSummary {
        evaluation,
        train_size: targets.len() - y_test.len(),
        test_size: y_test.len(),
        training_secs: 0.0,
    })
}
