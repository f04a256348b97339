use chrono::{DateTime, Utc};
use pulmo_model::EvaluationResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Lifecycle stage of a registered version.
///
/// Invariant (enforced by the transition contract, checked by the publisher):
/// at most one version per model name is `CurrentServing` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Experiment,
    CurrentServing,
    Archived,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Experiment => "experiment",
            Stage::CurrentServing => "current-serving",
            Stage::Archived => "archived",
        }
    }
}

// ---------------------------------------------------------------------------
// RegisteredVersion
// ---------------------------------------------------------------------------

/// One registry entry for a model name. Version numbers are un-gapped
/// increasing integers assigned by the registry; comparison is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredVersion {
    pub version: u32,
    pub stage: Stage,
}

// ---------------------------------------------------------------------------
// RunRecord
// ---------------------------------------------------------------------------

/// Metadata recorded with a newly registered version, kept for
/// reproducibility whether or not the version is ever promoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    /// Execution environment the run came from ("local" | "cloud").
    pub environment: String,
    /// Hash of the canonical model config used for the run.
    pub config_hash: String,
    /// Store key of the artifact this version was registered from.
    pub artifact_key: String,
    pub evaluation: EvaluationResult,
    /// Row counts of the train / held-out split the evaluation used.
    pub train_size: usize,
    pub test_size: usize,
    /// Wall-clock training duration, zero when the run only re-evaluated an
    /// existing artifact.
    pub training_secs: f64,
    pub created_at_utc: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// TransitionReport
// ---------------------------------------------------------------------------

/// Outcome of a stage-transition request.
///
/// The request is a single logical operation from the caller's perspective;
/// when the backing registry cannot make it atomic, partial results land in
/// `failed_archives` and the caller must treat that as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// Version now holding the target stage.
    pub promoted: u32,
    /// Versions transitioned to `Archived` as part of the same request.
    pub archived: Vec<u32>,
    /// Versions that should have been archived but were not.
    pub failed_archives: Vec<u32>,
}

impl TransitionReport {
    pub fn is_complete(&self) -> bool {
        self.failed_archives.is_empty()
    }
}
