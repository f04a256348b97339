use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    ModelRegistry, RegisteredVersion, RegistryError, RunRecord, Stage, TransitionReport,
};

/// JSON-over-HTTP registry client.
///
/// Wire contract (all under `{base}/api/v1`):
/// - `GET  /models/{name}/versions`                 -> `[RegisteredVersion]`
/// - `POST /models/{name}/versions` (RunRecord)     -> `{ "version": u32 }`
/// - `PUT  /models/{name}/versions/{v}/artifact`    <- raw blob bytes
/// - `POST /models/{name}/versions/{v}/transition`  -> `TransitionReport`
/// - `GET  /models/{name}/versions/{v}/artifact`    -> raw blob bytes
pub struct HttpRegistry {
    base: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TransitionRequest {
    stage: Stage,
    archive_others: bool,
}

#[derive(Deserialize)]
struct CreatedVersion {
    version: u32,
}

impl HttpRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }
}

#[async_trait]
impl ModelRegistry for HttpRegistry {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn list_versions(
        &self,
        model_name: &str,
    ) -> Result<Vec<RegisteredVersion>, RegistryError> {
        let resp = self
            .client
            .get(self.url(&format!("/models/{model_name}/versions")))
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp, model_name, None)?;
        resp.json().await.map_err(decode)
    }

    async fn create_version(
        &self,
        model_name: &str,
        run: &RunRecord,
        artifact: &[u8],
    ) -> Result<u32, RegistryError> {
        let resp = self
            .client
            .post(self.url(&format!("/models/{model_name}/versions")))
            .json(run)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp, model_name, None)?;
        let created: CreatedVersion = resp.json().await.map_err(decode)?;

        let resp = self
            .client
            .put(self.url(&format!(
                "/models/{model_name}/versions/{}/artifact",
                created.version
            )))
            .body(artifact.to_vec())
            .send()
            .await
            .map_err(transport)?;
        check_status(resp, model_name, Some(created.version))?;
        Ok(created.version)
    }

    async fn transition_stage(
        &self,
        model_name: &str,
        version: u32,
        target: Stage,
        archive_others: bool,
    ) -> Result<TransitionReport, RegistryError> {
        let resp = self
            .client
            .post(self.url(&format!(
                "/models/{model_name}/versions/{version}/transition"
            )))
            .json(&TransitionRequest {
                stage: target,
                archive_others,
            })
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp, model_name, Some(version))?;
        resp.json().await.map_err(decode)
    }

    async fn get_artifact(&self, model_name: &str, version: u32) -> Result<Vec<u8>, RegistryError> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/models/{model_name}/versions/{version}/artifact"
            )))
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp, model_name, Some(version))?;
        Ok(resp.bytes().await.map_err(transport)?.to_vec())
    }
}

fn transport(e: reqwest::Error) -> RegistryError {
    RegistryError::Transport(e.to_string())
}

fn decode(e: reqwest::Error) -> RegistryError {
    RegistryError::Decode(e.to_string())
}

fn check_status(
    resp: reqwest::Response,
    name: &str,
    version: Option<u32>,
) -> Result<reqwest::Response, RegistryError> {
    match resp.status() {
        s if s.is_success() => Ok(resp),
        StatusCode::NOT_FOUND => match version {
            Some(version) => Err(RegistryError::VersionNotFound {
                name: name.to_string(),
                version,
            }),
            None => Err(RegistryError::Transport(format!(
                "registry returned 404 for model {name}"
            ))),
        },
        s => Err(RegistryError::Transport(format!(
            "registry returned status {s} for model {name}"
        ))),
    }
}
