//! Latest-artifact selection.
//!
//! Artifact keys encode their capture time as `model_<YYYYMMDD>_<HHMMSS>.<ext>`.
//! The format is fixed-width zero-padded, so the lexicographically greatest
//! timestamp is also the chronologically latest. Keys that do not match the
//! pattern are excluded outright (fail closed) rather than guessed at.

use tracing::info;

use crate::{ArtifactStore, StoreError};

/// Extract the embedded `YYYYMMDD_HHMMSS` timestamp from an artifact key.
///
/// Returns `None` for any key that does not match
/// `model_<8 digits>_<6 digits>.<alnum ext>` exactly.
pub fn timestamp_of(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("model_")?;
    // Timestamp is exactly 15 bytes: 8 digits, '_', 6 digits.
    let (ts, tail) = rest.split_at_checked(15)?;
    let bytes = ts.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 => {
                if *b != b'_' {
                    return None;
                }
            }
            _ => {
                if !b.is_ascii_digit() {
                    return None;
                }
            }
        }
    }
    let ext = tail.strip_prefix('.')?;
    if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ts)
}

/// Select the key with the greatest embedded timestamp.
///
/// Identical timestamps resolve to the **last seen** in listing order. This
/// tie-break is deterministic for a given listing but otherwise arbitrary;
/// the key format leaves two same-second artifacts genuinely ambiguous.
pub fn select_latest_key(bucket: &str, keys: &[String]) -> Result<String, StoreError> {
    let mut best: Option<(&str, &String)> = None;
    for key in keys {
        let Some(ts) = timestamp_of(key) else {
            continue;
        };
        best = Some(match best {
            Some((best_ts, best_key)) if ts < best_ts => (best_ts, best_key),
            _ => (ts, key),
        });
    }
    match best {
        Some((_, key)) => Ok(key.clone()),
        None => Err(StoreError::NoArtifactsFound {
            bucket: bucket.to_string(),
        }),
    }
}

/// Fetch exactly one artifact from `bucket`.
///
/// With an explicit key, fetch it directly (`NotFound` if absent). Without
/// one, list the bucket, run [`select_latest_key`], and fetch the winner.
/// Returns `(key, bytes)`. No side effects beyond the read.
pub fn fetch_artifact(
    store: &dyn ArtifactStore,
    bucket: &str,
    explicit_key: Option<&str>,
) -> Result<(String, Vec<u8>), StoreError> {
    if let Some(key) = explicit_key {
        info!(bucket, key, "fetching explicit artifact");
        let bytes = store.get(bucket, key)?;
        return Ok((key.to_string(), bytes));
    }
    let keys = store.list_keys(bucket, "")?;
    let selected = select_latest_key(bucket, &keys)?;
    info!(bucket, key = %selected, "selected latest artifact");
    let bytes = store.get(bucket, &selected)?;
    Ok((selected, bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStore;

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn timestamp_parses_well_formed_key() {
        assert_eq!(
            timestamp_of("model_20240301_090000.pkl"),
            Some("20240301_090000")
        );
        assert_eq!(
            timestamp_of("model_20240101_100000.bin"),
            Some("20240101_100000")
        );
    }

    #[test]
    fn timestamp_rejects_malformed_keys() {
        for key in [
            "notamodel.txt",
            "model_.pkl",
            "model_2024030_090000.pkl",   // short date
            "model_20240301_09000.pkl",   // short time
            "model_20240301-090000.pkl",  // wrong separator
            "model_20240301_090000",      // no extension
            "model_20240301_090000.",     // empty extension
            "model_20240301_0900zz.pkl",  // non-digit time
            "model_20240301_090000.p k",  // non-alnum extension
            "xmodel_20240301_090000.pkl", // wrong prefix
        ] {
            assert_eq!(timestamp_of(key), None, "key should not match: {key}");
        }
    }

    #[test]
    fn latest_timestamp_wins_and_nonmatching_never_win() {
        // Worked example: the March artifact must win, the .txt never competes.
        let ks = keys(&[
            "model_20240101_100000.pkl",
            "model_20240301_090000.pkl",
            "notamodel.txt",
        ]);
        assert_eq!(
            select_latest_key("dev-models", &ks).unwrap(),
            "model_20240301_090000.pkl"
        );
    }

    #[test]
    fn only_nonmatching_keys_is_no_artifacts() {
        let ks = keys(&["notamodel.txt", "readme.md"]);
        let err = select_latest_key("dev-models", &ks).unwrap_err();
        assert_eq!(
            err,
            StoreError::NoArtifactsFound {
                bucket: "dev-models".to_string()
            }
        );
    }

    #[test]
    fn identical_timestamps_resolve_to_last_seen() {
        let ks = keys(&[
            "model_20240301_090000.aaa",
            "model_20240301_090000.bbb",
        ]);
        assert_eq!(
            select_latest_key("dev-models", &ks).unwrap(),
            "model_20240301_090000.bbb"
        );
        // Reversed listing order flips the winner: deterministic, not random.
        let rev = keys(&[
            "model_20240301_090000.bbb",
            "model_20240301_090000.aaa",
        ]);
        assert_eq!(
            select_latest_key("dev-models", &rev).unwrap(),
            "model_20240301_090000.aaa"
        );
    }

    #[test]
    fn fetch_explicit_key_not_found() {
        let store = MemStore::new();
        store.create_bucket("dev-models");
        let err = fetch_artifact(&store, "dev-models", Some("model_20240301_090000.bin"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn fetch_without_key_selects_latest() {
        let store = MemStore::new();
        store
            .put("dev-models", "model_20240101_100000.bin", b"old")
            .unwrap();
        store
            .put("dev-models", "model_20240301_090000.bin", b"new")
            .unwrap();
        store.put("dev-models", "notamodel.txt", b"junk").unwrap();

        let (key, bytes) = fetch_artifact(&store, "dev-models", None).unwrap();
        assert_eq!(key, "model_20240301_090000.bin");
        assert_eq!(bytes, b"new");
    }
}
