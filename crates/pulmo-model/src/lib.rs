//! Classifier training, evaluation, and artifact (de)serialization.
//!
//! The classifier itself is `smartcore`'s random forest; this crate owns the
//! conversion of image bytes to feature vectors, the held-out evaluation
//! logic, and the serialized artifact format. It knows nothing about where
//! artifacts are stored or how versions are registered.

mod artifact;
mod features;
mod metrics;
mod train;

pub use artifact::{ModelArtifact, ARTIFACT_SCHEMA_VERSION};
pub use features::{image_to_features, FEATURE_LEN, IMG_SIZE};
pub use metrics::{evaluate_predictions, ClassMetrics, EvaluationResult};
pub use train::{evaluate_holdout, train_model, TrainParams, TrainSummary};

/// Default class names, index-aligned with label codes 0 and 1.
pub const DEFAULT_LABELS: [&str; 2] = ["NORMAL", "PNEUMONIA"];
