use anyhow::{Context, Result};
use image::imageops::FilterType;

/// Fixed square geometry every image is resized to before flattening.
pub const IMG_SIZE: u32 = 64;

/// Length of the flattened feature vector (`IMG_SIZE` squared, grayscale).
pub const FEATURE_LEN: usize = (IMG_SIZE * IMG_SIZE) as usize;

/// Decode raw image bytes, convert to grayscale, resize to the fixed
/// geometry, and flatten row-major into a feature vector.
///
/// Fails with a descriptive error on undecodable bytes; callers surface that
/// to clients rather than dropping it.
pub fn image_to_features(bytes: &[u8]) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes).context("IMAGE_DECODE_FAILED: not a decodable image")?;
    let gray = img
        .resize_exact(IMG_SIZE, IMG_SIZE, FilterType::Triangle)
        .into_luma8();
    Ok(gray.into_raw().into_iter().map(f64::from).collect())
}
