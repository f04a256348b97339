use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    ModelRegistry, RegisteredVersion, RegistryError, RunRecord, Stage, TransitionReport,
};

struct Entry {
    version: u32,
    stage: Stage,
    #[allow(dead_code)]
    run: RunRecord,
    artifact: Vec<u8>,
}

/// In-memory registry used by tests and local single-process runs.
///
/// Fault-injection switches simulate the failure modes the loader and the
/// publisher must survive: an unreachable registry and a transition that
/// archives only some of the predecessors.
#[derive(Default)]
pub struct MemRegistry {
    models: Mutex<BTreeMap<String, Vec<Entry>>>,
    fail_listing: AtomicBool,
    partial_archives: AtomicBool,
}

impl MemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `list_versions` calls fail with a transport error while set.
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Transition requests promote but leave predecessors unarchived while
    /// set, producing a partial [`TransitionReport`].
    pub fn set_partial_archives(&self, partial: bool) {
        self.partial_archives.store(partial, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelRegistry for MemRegistry {
    fn name(&self) -> &'static str {
        "mem"
    }

    async fn list_versions(
        &self,
        model_name: &str,
    ) -> Result<Vec<RegisteredVersion>, RegistryError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RegistryError::Transport(
                "injected: registry unreachable".to_string(),
            ));
        }
        let models = self.models.lock().expect("mem registry poisoned");
        Ok(models
            .get(model_name)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| RegisteredVersion {
                        version: e.version,
                        stage: e.stage,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_version(
        &self,
        model_name: &str,
        run: &RunRecord,
        artifact: &[u8],
    ) -> Result<u32, RegistryError> {
        let mut models = self.models.lock().expect("mem registry poisoned");
        let entries = models.entry(model_name.to_string()).or_default();
        let version = entries.iter().map(|e| e.version).max().unwrap_or(0) + 1;
        entries.push(Entry {
            version,
            stage: Stage::Experiment,
            run: run.clone(),
            artifact: artifact.to_vec(),
        });
        Ok(version)
    }

    async fn transition_stage(
        &self,
        model_name: &str,
        version: u32,
        target: Stage,
        archive_others: bool,
    ) -> Result<TransitionReport, RegistryError> {
        let partial = self.partial_archives.load(Ordering::SeqCst);
        let mut models = self.models.lock().expect("mem registry poisoned");
        let entries = models
            .get_mut(model_name)
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version,
            })?;
        if !entries.iter().any(|e| e.version == version) {
            return Err(RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version,
            });
        }

        let mut archived = Vec::new();
        let mut failed_archives = Vec::new();
        for entry in entries.iter_mut() {
            if entry.version == version {
                entry.stage = target;
            } else if archive_others && entry.stage != Stage::Archived {
                if partial {
                    failed_archives.push(entry.version);
                } else {
                    entry.stage = Stage::Archived;
                    archived.push(entry.version);
                }
            }
        }

        Ok(TransitionReport {
            promoted: version,
            archived,
            failed_archives,
        })
    }

    async fn get_artifact(&self, model_name: &str, version: u32) -> Result<Vec<u8>, RegistryError> {
        let models = self.models.lock().expect("mem registry poisoned");
        models
            .get(model_name)
            .and_then(|entries| entries.iter().find(|e| e.version == version))
            .map(|e| e.artifact.clone())
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version,
            })
    }
}
