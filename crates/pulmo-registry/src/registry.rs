use async_trait::async_trait;

use crate::{RegisteredVersion, RegistryError, RunRecord, Stage, TransitionReport};

/// Registry client contract.
///
/// Object-safe (`Box<dyn ModelRegistry>` / `Arc<dyn ModelRegistry>`) and
/// `Send + Sync` so the serving loader can poll it from a background task
/// while the trainer publishes from another process.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Human-readable backend name (e.g. `"http"`).
    fn name(&self) -> &'static str;

    /// All versions registered under `model_name`, any order.
    async fn list_versions(
        &self,
        model_name: &str,
    ) -> Result<Vec<RegisteredVersion>, RegistryError>;

    /// Register a new version from `artifact` with its run metadata.
    ///
    /// The registry assigns the next integer version number and returns it;
    /// the new version starts in [`Stage::Experiment`].
    async fn create_version(
        &self,
        model_name: &str,
        run: &RunRecord,
        artifact: &[u8],
    ) -> Result<u32, RegistryError>;

    /// Transition `version` to `target`; with `archive_others`, transition
    /// every other version of the model to [`Stage::Archived`] as part of the
    /// same logical request.
    ///
    /// Implementations that cannot guarantee atomicity must report partial
    /// outcomes in the returned [`TransitionReport`] rather than masking them.
    async fn transition_stage(
        &self,
        model_name: &str,
        version: u32,
        target: Stage,
        archive_others: bool,
    ) -> Result<TransitionReport, RegistryError>;

    /// Fetch the artifact blob registered for `version`.
    async fn get_artifact(&self, model_name: &str, version: u32) -> Result<Vec<u8>, RegistryError>;
}
