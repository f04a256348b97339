//! Axum router and all HTTP handlers for pulmo-serve.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.
//!
//! Handlers never block on the loader: a request while no model is installed
//! fails fast with 503, and malformed input is reported back with a
//! descriptive 400 rather than dropped.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, warn};

use crate::{
    api_types::{
        DiagnoseResponse, ErrorResponse, FeedbackRequest, FeedbackResponse, HealthResponse,
        ModelInfoResponse, PredictRequest, PredictResponse, ReloadResponse, StatusResponse,
    },
    loader::spawn_loader,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/predict", post(predict))
        .route("/v1/diagnose", post(diagnose))
        .route("/v1/feedback", post(feedback))
        .route("/v1/model/reload", post(reload_model))
        .route("/v1/model/info", get(model_info))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let loaded_version = st.served_model().await.map(|m| m.version);
    (
        StatusCode::OK,
        Json(StatusResponse {
            model: st.model_name.clone(),
            phase: st.loader_phase().await,
            generation: st.current_generation(),
            loaded_version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/predict
// ---------------------------------------------------------------------------

pub(crate) async fn predict(State(st): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(served) = st.served_model().await else {
        return unavailable();
    };

    let req: PredictRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => return bad_request(format!("MALFORMED_REQUEST: {e}")),
    };
    if req.features.is_empty() {
        return bad_request("MALFORMED_REQUEST: 'features' array is empty".to_string());
    }

    let label_code = match served.artifact.predict_one(&req.features) {
        Ok(code) => code,
        Err(e) => return bad_request(format!("MALFORMED_REQUEST: {e}")),
    };
    let label = served
        .artifact
        .label_name(label_code)
        .map(str::to_string)
        .unwrap_or_else(|| label_code.to_string());
    let probabilities = served.artifact.predict_proba_one(&req.features);

    info!(label_code, %label, "prediction served");
    (
        StatusCode::OK,
        Json(PredictResponse {
            label_code,
            label,
            probabilities,
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/diagnose
// ---------------------------------------------------------------------------

pub(crate) async fn diagnose(State(st): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(served) = st.served_model().await else {
        return unavailable();
    };
    if body.is_empty() {
        return bad_request("MALFORMED_REQUEST: no image bytes provided".to_string());
    }

    let started = Instant::now();
    let features = match pulmo_model::image_to_features(&body) {
        Ok(features) => features,
        Err(e) => return bad_request(format!("MALFORMED_REQUEST: {e}")),
    };

    // Probability-based result when the model supports it, label-based
    // fallback otherwise.
    let response = if let Some(probs) = served.artifact.predict_proba_one(&features) {
        let pneumonia_probability = probs.get(1).copied();
        let diagnosis = match pneumonia_probability {
            Some(p) => format!("Pneumonia probability: {:.2}%", p * 100.0),
            None => format!("Predicted probabilities: {probs:?}"),
        };
        DiagnoseResponse {
            diagnosis,
            pneumonia_probability,
            label_code: None,
            inference_secs: started.elapsed().as_secs_f64(),
        }
    } else {
        let label_code = match served.artifact.predict_one(&features) {
            Ok(code) => code,
            Err(e) => return bad_request(format!("MALFORMED_REQUEST: {e}")),
        };
        let label = served
            .artifact
            .label_name(label_code)
            .map(str::to_string)
            .unwrap_or_else(|| label_code.to_string());
        DiagnoseResponse {
            diagnosis: format!("Predicted class: {label} ({label_code})"),
            pneumonia_probability: None,
            label_code: Some(label_code),
            inference_secs: started.elapsed().as_secs_f64(),
        }
    };

    info!(diagnosis = %response.diagnosis, "diagnosis served");
    (StatusCode::OK, Json(response)).into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/feedback
// ---------------------------------------------------------------------------

/// Record user feedback on a served prediction in the structured log.
///
/// Model-independent: feedback is accepted whether or not a model is
/// currently installed. Both fields are optional; an unparsable or missing
/// JSON body is the only rejection.
pub(crate) async fn feedback(body: Bytes) -> Response {
    let req: FeedbackRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => return bad_request(format!("MALFORMED_REQUEST: {e}")),
    };

    info!(image_id = %req.image_id, feedback = %req.feedback, "user feedback received");
    (
        StatusCode::OK,
        Json(FeedbackResponse {
            message: "feedback recorded".to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// POST /v1/model/reload
// ---------------------------------------------------------------------------

/// Start a fresh load generation. The previously served handle keeps
/// answering requests until the new attempt installs its replacement; a
/// superseded in-flight attempt commits nothing.
pub(crate) async fn reload_model(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let generation = spawn_loader(Arc::clone(&st));
    info!(generation, "model reload requested");
    (
        StatusCode::OK,
        Json(ReloadResponse {
            message: "model reload started in background".to_string(),
            generation,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/model/info
// ---------------------------------------------------------------------------

/// Queries the registry on each request so the answer reflects the current
/// version, not whatever happens to be loaded.
pub(crate) async fn model_info(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let latest_version = match st.registry.list_versions(&st.model_name).await {
        Ok(versions) => versions.iter().map(|v| v.version).max(),
        Err(e) => {
            warn!(model = %st.model_name, error = %e, "model info query failed");
            None
        }
    };
    (
        StatusCode::OK,
        Json(ModelInfoResponse {
            model: st.model_name.clone(),
            latest_version,
        }),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "MODEL_UNAVAILABLE: no model loaded".to_string(),
        }),
    )
        .into_response()
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
