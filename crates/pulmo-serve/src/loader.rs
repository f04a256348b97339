//! Background model loader.
//!
//! Polls the registry until a usable version exists, loads its artifact, and
//! installs the handle — without ever blocking server startup. Each attempt
//! carries a generation id; a reload supersedes the previous generation, and
//! a superseded attempt exits at its next retry boundary instead of
//! committing a stale handle.

use std::sync::Arc;
use std::time::Instant;

use pulmo_model::ModelArtifact;
use pulmo_registry::{RegisteredVersion, RegistryError, Stage};
use tracing::{debug, info, warn};

use crate::state::{AppState, LoaderPhase, ServedModel};

/// Start a new load generation and spawn its polling task.
/// Returns the generation id (also exposed via `/v1/status`).
pub fn spawn_loader(state: Arc<AppState>) -> u64 {
    let generation = state.begin_load_generation();
    info!(generation, model = %state.model_name, "starting background model load");
    tokio::spawn(run_loader(state, generation));
    generation
}

/// Pick which version to load: a version in the preferred stage when one
/// exists, otherwise the highest-numbered version regardless of stage.
pub fn pick_version(versions: &[RegisteredVersion], preferred: Stage) -> Option<u32> {
    let staged = versions
        .iter()
        .filter(|v| v.stage == preferred)
        .map(|v| v.version)
        .max();
    staged.or_else(|| versions.iter().map(|v| v.version).max())
}

async fn run_loader(state: Arc<AppState>, generation: u64) {
    state
        .set_phase_if_current(generation, LoaderPhase::Polling)
        .await;
    let deadline = Instant::now() + state.poll_timeout;

    loop {
        // Generation check doubles as the cancellation point between retries.
        if !state.is_current_generation(generation) {
            debug!(generation, "load attempt superseded; exiting");
            return;
        }

        match attempt_load(&state).await {
            Ok(served) => {
                let version = served.version;
                if state.install_if_current(generation, Arc::new(served)).await {
                    info!(generation, version, "model loaded and installed");
                } else {
                    debug!(generation, version, "load finished stale; result discarded");
                }
                return;
            }
            Err(reason) => {
                warn!(generation, model = %state.model_name, %reason, "model load attempt failed");
            }
        }

        if Instant::now() >= deadline {
            if state
                .set_phase_if_current(generation, LoaderPhase::TimedOut)
                .await
            {
                warn!(
                    generation,
                    model = %state.model_name,
                    timeout_secs = state.poll_timeout.as_secs(),
                    "LOAD_TIMEOUT: gave up waiting for a usable model version"
                );
            }
            return;
        }
        tokio::time::sleep(state.poll_interval).await;
    }
}

/// One poll iteration: query versions, pick one, fetch and decode its
/// artifact. Every failure mode is an `Err(reason)` for the retry loop.
async fn attempt_load(state: &AppState) -> Result<ServedModel, String> {
    let versions = state
        .registry
        .list_versions(&state.model_name)
        .await
        .map_err(|e| e.to_string())?;
    let Some(version) = pick_version(&versions, state.preferred_stage) else {
        return Err(RegistryError::NoVersionsRegistered {
            name: state.model_name.clone(),
        }
        .to_string());
    };
    debug!(version, "attempting to load model version");

    let bytes = state
        .registry
        .get_artifact(&state.model_name, version)
        .await
        .map_err(|e| e.to_string())?;
    let artifact = ModelArtifact::from_bytes(&bytes).map_err(|e| e.to_string())?;

    Ok(ServedModel {
        model_name: state.model_name.clone(),
        version,
        artifact,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
