//! Shared runtime state for pulmo-serve.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The served-model
//! handle is the only shared mutable resource: one writer (the loader task),
//! many readers, replaced only by atomic swap of a fully constructed
//! snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulmo_model::ModelArtifact;
use pulmo_registry::{ModelRegistry, Stage};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// ServedModel
// ---------------------------------------------------------------------------

/// A fully loaded model plus the registry coordinates it came from.
/// Immutable once constructed; readers clone the `Arc`, never the model.
pub struct ServedModel {
    pub model_name: String,
    pub version: u32,
    pub artifact: ModelArtifact,
}

// ---------------------------------------------------------------------------
// LoaderPhase
// ---------------------------------------------------------------------------

/// Observable state of the background loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    Idle,
    Polling,
    Loaded,
    /// The poll budget ran out. Non-fatal: handlers keep answering with
    /// "model unavailable" and a reload can restart polling.
    TimedOut,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers and loader tasks.
pub struct AppState {
    pub build: BuildInfo,
    pub registry: Arc<dyn ModelRegistry>,
    /// Registered model name this daemon serves.
    pub model_name: String,
    /// Stage the loader prefers when picking a version.
    pub preferred_stage: Stage,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    /// Served model handle. `None` until the first successful load.
    model: RwLock<Option<Arc<ServedModel>>>,
    phase: RwLock<LoaderPhase>,
    /// Latest load generation handed out. A load attempt may only commit
    /// results while its own generation is still the latest.
    generation: AtomicU64,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn ModelRegistry>,
        model_name: impl Into<String>,
        preferred_stage: Stage,
        poll_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            build: BuildInfo {
                service: "pulmo-serve",
                version: env!("CARGO_PKG_VERSION"),
            },
            registry,
            model_name: model_name.into(),
            preferred_stage,
            poll_timeout,
            poll_interval,
            model: RwLock::new(None),
            phase: RwLock::new(LoaderPhase::Idle),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the served model, if any. Never a partially built object.
    pub async fn served_model(&self) -> Option<Arc<ServedModel>> {
        self.model.read().await.clone()
    }

    pub async fn loader_phase(&self) -> LoaderPhase {
        *self.phase.read().await
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a new load generation, superseding any in-flight attempt.
    pub fn begin_load_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current_generation(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Install `served` as the live handle iff `generation` has not been
    /// superseded. A stale attempt completing after a newer reload request
    /// commits nothing. Returns whether the install happened.
    pub async fn install_if_current(&self, generation: u64, served: Arc<ServedModel>) -> bool {
        // Re-check under the write lock so a reload racing this commit
        // cannot interleave between check and install.
        let mut slot = self.model.write().await;
        if !self.is_current_generation(generation) {
            return false;
        }
        *slot = Some(served);
        drop(slot);
        self.set_phase_if_current(generation, LoaderPhase::Loaded)
            .await;
        true
    }

    /// Update the observable phase iff `generation` is still the latest.
    pub async fn set_phase_if_current(&self, generation: u64, phase: LoaderPhase) -> bool {
        let mut slot = self.phase.write().await;
        if !self.is_current_generation(generation) {
            return false;
        }
        *slot = phase;
        true
    }
}
