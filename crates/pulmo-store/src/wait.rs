use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::ArtifactStore;

/// Wait until `bucket` exists and is reachable, polling every `interval`.
///
/// Returns `true` once the bucket is available, `false` when `timeout`
/// elapses first. Probe errors count as "not yet available" and are retried;
/// only the clock terminates the loop. The task yields to the runtime
/// between probes rather than parking its worker thread.
pub async fn wait_for_bucket(
    store: &dyn ArtifactStore,
    bucket: &str,
    timeout: Duration,
    interval: Duration,
) -> bool {
    let start = Instant::now();
    loop {
        match store.bucket_exists(bucket) {
            Ok(true) => return true,
            Ok(false) => debug!(bucket, "bucket not available yet"),
            Err(e) => warn!(bucket, error = %e, "bucket probe failed"),
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}
