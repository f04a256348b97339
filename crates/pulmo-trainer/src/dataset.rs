//! Labeled dataset loading from the datasource bucket.
//!
//! The bucket layout encodes the labels: every key under `Normal/` is class
//! code 0, every key under `Pneumonia/` is class code 1. Images are decoded
//! to grayscale, resized, and flattened into feature rows.

use anyhow::{bail, Result};
use pulmo_model::image_to_features;
use pulmo_store::ArtifactStore;
use tracing::{info, warn};

/// Bucket prefix -> label code mapping, index-aligned with
/// [`pulmo_model::DEFAULT_LABELS`].
pub const CLASS_PREFIXES: [(&str, u32); 2] = [("Normal/", 0), ("Pneumonia/", 1)];

#[derive(Debug)]
pub struct LabeledDataset {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<u32>,
    /// Keys that could not be decoded as images; logged and skipped.
    pub skipped: usize,
}

/// Load every image under the class prefixes of `bucket` into feature rows.
///
/// Undecodable blobs are skipped with a warning rather than aborting the
/// run; an entirely empty result is an error since nothing can be trained.
pub fn load_labeled_features(
    store: &dyn ArtifactStore,
    bucket: &str,
) -> Result<LabeledDataset> {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut skipped = 0usize;

    for (prefix, code) in CLASS_PREFIXES {
        let keys = store.list_keys(bucket, prefix)?;
        info!(bucket, prefix, count = keys.len(), "listing class images");
        for key in keys {
            let bytes = store.get(bucket, &key)?;
            match image_to_features(&bytes) {
                Ok(features) => {
                    x.push(features);
                    y.push(code);
                }
                Err(e) => {
                    warn!(bucket, key = %key, error = %e, "skipping undecodable image");
                    skipped += 1;
                }
            }
        }
    }

    if x.is_empty() {
        bail!("DATASET_INVALID: no decodable images in bucket {bucket}");
    }
    info!(bucket, samples = x.len(), skipped, "labeled dataset loaded");
    Ok(LabeledDataset { x, y, skipped })
}
