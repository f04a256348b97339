//! Request and response types for all pulmo-serve HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use serde::{Deserialize, Serialize};

use crate::state::LoaderPhase;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub model: String,
    pub phase: LoaderPhase,
    /// Latest load generation handed out.
    pub generation: u64,
    /// Version of the currently served model, if one is installed.
    pub loaded_version: Option<u32>,
}

// ---------------------------------------------------------------------------
// Error body (400 / 503)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/predict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label_code: u32,
    pub label: String,
    /// Per-class probabilities when the model supports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// /v1/diagnose
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnoseResponse {
    /// Human-readable result line (probability- or label-based).
    pub diagnosis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pneumonia_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_code: Option<u32>,
    pub inference_secs: f64,
}

// ---------------------------------------------------------------------------
// /v1/feedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Identifier of the prediction or image the feedback refers to.
    #[serde(default = "unknown_image_id")]
    pub image_id: String,
    #[serde(default)]
    pub feedback: String,
}

fn unknown_image_id() -> String {
    "N/A".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// /v1/model/reload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub message: String,
    /// Generation of the freshly spawned load attempt.
    pub generation: u64,
}

// ---------------------------------------------------------------------------
// /v1/model/info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model: String,
    /// Highest registered version, `None` when the registry is empty or
    /// unreachable.
    pub latest_version: Option<u32>,
}
