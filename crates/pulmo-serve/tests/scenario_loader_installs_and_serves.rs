//! Scenario: the background loader finds a registered model, installs it,
//! and the prediction endpoints serve real inferences from it.
//!
//! A trained artifact is seeded into an in-memory registry; version 1 holds
//! the current-serving stage while a later experiment version exists, so
//! these tests also pin the version-selection rule (serving stage wins over
//! a higher version number).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use pulmo_model::{image_to_features, train_model, EvaluationResult, TrainParams, DEFAULT_LABELS};
use pulmo_registry::{MemRegistry, ModelRegistry, RunRecord, Stage};
use pulmo_serve::{
    loader,
    routes,
    state::{AppState, LoaderPhase},
};
use tower::ServiceExt; // oneshot
use uuid::Uuid;

const MODEL: &str = "pneumonia-rf";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encode a uniform 64x64 grayscale PNG.
fn png_bytes(luma: u8) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(64, 64, image::Luma([luma]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// Train a small forest on image-derived features: dark frames are class 0,
/// bright frames are class 1.
fn trained_artifact_bytes() -> Vec<u8> {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..8u8 {
        x.push(image_to_features(&png_bytes(10 + i * 3)).expect("dark png decodes"));
        y.push(0);
        x.push(image_to_features(&png_bytes(220 + i * 3)).expect("bright png decodes"));
        y.push(1);
    }
    let labels: Vec<String> = DEFAULT_LABELS.iter().map(|s| s.to_string()).collect();
    let params = TrainParams {
        n_trees: 10,
        ..TrainParams::default()
    };
    let (artifact, _) = train_model(&x, &y, &labels, &params).expect("training succeeds");
    artifact.to_bytes().expect("artifact encodes")
}

fn run_record(artifact_key: &str) -> RunRecord {
    RunRecord {
        run_id: Uuid::new_v4(),
        environment: "local".to_string(),
        config_hash: "0123abcd".to_string(),
        artifact_key: artifact_key.to_string(),
        evaluation: EvaluationResult {
            accuracy: 0.9,
            report: BTreeMap::new(),
        },
        train_size: 12,
        test_size: 4,
        training_secs: 0.1,
        created_at_utc: Utc::now(),
    }
}

/// Registry with v1 (trained, current-serving) and v2 (junk experiment).
/// The loader must pick v1 even though v2 is numerically higher.
async fn seeded_registry() -> Arc<MemRegistry> {
    let registry = Arc::new(MemRegistry::new());
    let v1 = registry
        .create_version(MODEL, &run_record("model_20250101_090000.bin"), &trained_artifact_bytes())
        .await
        .expect("create v1");
    registry
        .transition_stage(MODEL, v1, Stage::CurrentServing, false)
        .await
        .expect("promote v1");
    registry
        .create_version(MODEL, &run_record("model_20250102_090000.bin"), b"not a model")
        .await
        .expect("create v2");
    registry
}

async fn loaded_state(registry: Arc<MemRegistry>) -> Arc<AppState> {
    let st = Arc::new(AppState::new(
        registry,
        MODEL,
        Stage::CurrentServing,
        Duration::from_secs(5),
        Duration::from_millis(10),
    ));
    loader::spawn_loader(Arc::clone(&st));
    wait_for_phase(&st, LoaderPhase::Loaded).await;
    st
}

async fn wait_for_phase(st: &AppState, want: LoaderPhase) {
    for _ in 0..500 {
        if st.loader_phase().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("loader never reached {want:?}");
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

// ---------------------------------------------------------------------------
// Loader picks the serving version, not the highest one
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loader_installs_the_current_serving_version() {
    let st = loaded_state(seeded_registry().await).await;

    let served = st.served_model().await.expect("model installed");
    assert_eq!(served.version, 1, "serving stage beats higher version number");
    assert_eq!(served.model_name, MODEL);

    let router = routes::build_router(st);
    let req = Request::builder()
        .method("GET")
        .uri("/v1/status")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["phase"], "loaded");
    assert_eq!(json["loaded_version"], 1);
}

// ---------------------------------------------------------------------------
// POST /v1/predict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn predict_classifies_a_bright_feature_vector_as_pneumonia() {
    let st = loaded_state(seeded_registry().await).await;
    let router = routes::build_router(st);

    let features = image_to_features(&png_bytes(230)).expect("png decodes");
    let payload = serde_json::json!({ "features": features });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/predict")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(payload.to_string()))
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["label_code"], 1);
    assert_eq!(json["label"], "PNEUMONIA");
}

#[tokio::test]
async fn malformed_predict_bodies_are_rejected_with_400() {
    let st = loaded_state(seeded_registry().await).await;

    // Not JSON at all.
    let req = Request::builder()
        .method("POST")
        .uri("/v1/predict")
        .body(axum::body::Body::from("{{{"))
        .unwrap();
    let (status, body) = call(routes::build_router(Arc::clone(&st)), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse_json(body)["error"]
        .as_str()
        .expect("error field")
        .starts_with("MALFORMED_REQUEST"));

    // Valid JSON, empty feature vector.
    let req = Request::builder()
        .method("POST")
        .uri("/v1/predict")
        .body(axum::body::Body::from(r#"{"features":[]}"#))
        .unwrap();
    let (status, body) = call(routes::build_router(Arc::clone(&st)), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse_json(body)["error"]
        .as_str()
        .expect("error field")
        .starts_with("MALFORMED_REQUEST"));
}

// A non-empty vector with the wrong width must be a 400, never a confident
// answer and never a handler panic: the model was fitted on 64x64 = 4096
// features.
#[tokio::test]
async fn predict_rejects_a_wrong_width_feature_vector_with_400() {
    let st = loaded_state(seeded_registry().await).await;
    let router = routes::build_router(st);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/predict")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"features":[1.0,2.0]}"#))
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error = parse_json(body)["error"]
        .as_str()
        .expect("error field")
        .to_string();
    assert!(error.starts_with("MALFORMED_REQUEST"), "got: {error}");
    assert!(error.contains("FEATURE_COUNT_MISMATCH"), "got: {error}");
    assert!(error.contains("4096"), "got: {error}");
}

// ---------------------------------------------------------------------------
// POST /v1/diagnose
// ---------------------------------------------------------------------------

#[tokio::test]
async fn diagnose_answers_with_a_diagnosis_for_a_valid_image() {
    let st = loaded_state(seeded_registry().await).await;
    let router = routes::build_router(st);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/diagnose")
        .body(axum::body::Body::from(png_bytes(235)))
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    let diagnosis = json["diagnosis"].as_str().expect("diagnosis field");
    assert!(!diagnosis.is_empty());
    assert!(json["inference_secs"].as_f64().expect("timing") >= 0.0);
    // This model has no probability capability, so the label path answers.
    assert_eq!(json["label_code"], 1);
}

#[tokio::test]
async fn diagnose_rejects_undecodable_bytes_with_400() {
    let st = loaded_state(seeded_registry().await).await;
    let router = routes::build_router(st);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/diagnose")
        .body(axum::body::Body::from(vec![0xDEu8, 0xAD, 0xBE, 0xEF]))
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse_json(body)["error"]
        .as_str()
        .expect("error field")
        .starts_with("MALFORMED_REQUEST"));
}

// ---------------------------------------------------------------------------
// GET /v1/model/info
// ---------------------------------------------------------------------------

#[tokio::test]
async fn model_info_reports_the_highest_registered_version() {
    let st = loaded_state(seeded_registry().await).await;
    let router = routes::build_router(st);

    let req = Request::builder()
        .method("GET")
        .uri("/v1/model/info")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["model"], MODEL);
    // Info reflects the registry (v2 exists), not what is loaded (v1).
    assert_eq!(json["latest_version"], 2);
}
