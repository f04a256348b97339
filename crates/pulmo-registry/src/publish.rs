//! Promotion-transition policy: which registered version becomes
//! current-serving, and how predecessors are archived.

use pulmo_promotion::PromoteDecision;
use tracing::{info, warn};

use crate::{ModelRegistry, RegistryError, RunRecord, Stage};

/// Outcome of publishing one run's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The given version now holds the current-serving stage.
    Promoted { version: u32 },
    /// Promotion was requested but the registry has no versions. Logged as a
    /// warning; the run itself is still considered recorded.
    NoVersions,
    /// Experiment-only run; no stage transition was issued.
    ExperimentOnly,
}

/// Register a new version from `artifact` + `run`, then apply `decision`.
///
/// Errors from either step propagate to the caller and should abort the
/// training pipeline with a clear exit condition.
pub async fn register_run(
    registry: &dyn ModelRegistry,
    model_name: &str,
    run: &RunRecord,
    artifact: &[u8],
    decision: PromoteDecision,
) -> Result<PublishOutcome, RegistryError> {
    let version = registry.create_version(model_name, run, artifact).await?;
    info!(
        model = model_name,
        version,
        run_id = %run.run_id,
        "registered new model version"
    );
    publish_decision(registry, model_name, decision).await
}

/// Apply a promote decision to the registry.
///
/// On [`PromoteDecision::PromoteToServing`]: the highest **numeric** version
/// transitions to [`Stage::CurrentServing`] while all others are archived in
/// the same request. A partial result (any predecessor left unarchived) is a
/// [`RegistryError::TransitionFailure`], surfaced, never swallowed.
pub async fn publish_decision(
    registry: &dyn ModelRegistry,
    model_name: &str,
    decision: PromoteDecision,
) -> Result<PublishOutcome, RegistryError> {
    if decision == PromoteDecision::ExperimentOnly {
        info!(model = model_name, "registered as experiment only");
        return Ok(PublishOutcome::ExperimentOnly);
    }

    let versions = registry.list_versions(model_name).await?;
    let Some(latest) = versions.iter().map(|v| v.version).max() else {
        warn!(
            model = model_name,
            "no versions registered; nothing to promote"
        );
        return Ok(PublishOutcome::NoVersions);
    };

    let report = registry
        .transition_stage(model_name, latest, Stage::CurrentServing, true)
        .await?;
    if report.promoted != latest || !report.is_complete() {
        return Err(RegistryError::TransitionFailure {
            name: model_name.to_string(),
            detail: format!(
                "promoted={} expected={} unarchived={:?}",
                report.promoted, latest, report.failed_archives
            ),
        });
    }

    info!(
        model = model_name,
        version = latest,
        archived = report.archived.len(),
        "promoted version to current-serving"
    );
    Ok(PublishOutcome::Promoted { version: latest })
}
