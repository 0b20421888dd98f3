//! Deadline and retry helpers.
//!
//! Independent of the cache and the queue; wrap any flaky remote call.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// Runs `producer` with a deadline, retrying up to `retries` more times.
///
/// Each attempt is bounded by `timeout`; a timed-out attempt is dropped.
/// Retries follow immediately with no backoff. The last attempt's error is
/// returned once retries are exhausted.
pub async fn time_out<T, F, Fut>(mut producer: F, timeout: Duration, retries: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        let error = match tokio::time::timeout(timeout, producer()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => CacheError::Producer(err),
            Err(_) => CacheError::Timeout(timeout),
        };

        if attempt >= retries {
            warn!(attempts = attempt + 1, error = %error, "giving up");
            return Err(error);
        }
        attempt += 1;
        debug!(attempt, retries, error = %error, "retrying");
    }
}

/// Sleeps for `duration`.
pub async fn wait(duration: Duration) {
    tokio::time::sleep(duration).await;
}
