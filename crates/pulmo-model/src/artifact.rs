use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Bumped whenever the serialized layout changes incompatibly.
pub const ARTIFACT_SCHEMA_VERSION: i32 = 1;

pub(crate) type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// The serialized trained-model blob.
///
/// Stored opaque in the artifact store and in the registry; only this crate
/// understands the layout. Immutable once written.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: i32,
    /// Class names, index-aligned with predicted label codes.
    pub labels: Vec<String>,
    /// Width of the feature rows the forest was fitted on.
    pub feature_len: usize,
    pub trained_at_utc: DateTime<Utc>,
    pub(crate) forest: Forest,
}

impl ModelArtifact {
    /// Serialize to the on-store byte format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("artifact serialize failed")
    }

    /// Decode an artifact blob, rejecting unknown schema versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact =
            serde_json::from_slice(bytes).context("ARTIFACT_DECODE_FAILED: not a model blob")?;
        if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
            bail!(
                "ARTIFACT_SCHEMA_MISMATCH: blob version {} != supported {}",
                artifact.schema_version,
                ARTIFACT_SCHEMA_VERSION
            );
        }
        Ok(artifact)
    }

    /// Predict label codes for a batch of feature rows.
    ///
    /// Every row must have exactly [`Self::feature_len`] features; the
    /// forest silently indexes out of the fitted width otherwise.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<u32>> {
        if let Some(row) = rows.iter().find(|r| r.len() != self.feature_len) {
            bail!(
                "FEATURE_COUNT_MISMATCH: got {} features, model expects {}",
                row.len(),
                self.feature_len
            );
        }
        let x = to_matrix(rows)?;
        self.forest
            .predict(&x)
            .map_err(|e| anyhow!("classifier predict failed: {e}"))
    }

    /// Predict the label code for a single feature vector.
    pub fn predict_one(&self, features: &[f64]) -> Result<u32> {
        let mut out = self.predict_batch(std::slice::from_ref(&features.to_vec()))?;
        out.pop().ok_or_else(|| anyhow!("classifier returned no prediction"))
    }

    /// Per-class probabilities for a single feature vector, when the
    /// underlying model supports them.
    ///
    /// The random forest backend exposes no calibrated probabilities, so this
    /// returns `None`; label-capable callers must fall back to
    /// [`Self::predict_one`]. The seam exists so a probability-capable
    /// backend can slot in without touching the serving layer.
    pub fn predict_proba_one(&self, _features: &[f64]) -> Option<Vec<f64>> {
        None
    }

    /// Name for a predicted label code, if in range.
    pub fn label_name(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }
}

/// Validate shape by hand before handing rows to `DenseMatrix::from_2d_vec`,
/// which panics on ragged input instead of returning an error.
pub(crate) fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let Some(first) = rows.first() else {
        bail!("FEATURE_MATRIX_INVALID: no feature rows");
    };
    let width = first.len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        bail!("FEATURE_MATRIX_INVALID: rows must all share one non-zero length");
    }
    let owned: Vec<Vec<f64>> = rows.to_vec();
    Ok(DenseMatrix::from_2d_vec(&owned))
}
