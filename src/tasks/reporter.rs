//! Stats Reporter Task
//!
//! Background task that periodically logs the session's cache, queue and
//! registry counters. Read-only: it never touches access counters.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::session::Session;

/// Spawns a background task that logs session statistics every interval.
///
/// A record is logged at `info` when something changed since the previous
/// tick and at `debug` otherwise.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let session = Session::new(&Config::default());
/// let reporter = spawn_stats_reporter(session.clone(), 30);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter(session: Session, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting stats reporter with interval of {} seconds", interval.as_secs());

        let mut last_activity = None;
        loop {
            tokio::time::sleep(interval).await;

            let stats = session.stats().await;
            let activity = (
                stats.cache.sets,
                stats.cache.hits + stats.cache.misses,
                stats.cache.clears,
                stats.queue.enqueued,
                stats.instance_entries,
            );

            if last_activity == Some(activity) {
                debug!(entries = stats.cache.total_entries, "session idle");
                continue;
            }
            last_activity = Some(activity);

            info!(
                cache_entries = stats.cache.total_entries,
                cache_hits = stats.cache.hits,
                cache_misses = stats.cache.misses,
                hit_rate = stats.cache.hit_rate(),
                queue_pending = stats.queue.pending,
                queue_completed = stats.queue.completed,
                queue_failed = stats.queue.failed,
                queue_cancelled = stats.queue.cancelled,
                instance_entries = stats.instance_entries,
                "session stats"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::instance::InstanceKey;

    #[tokio::test]
    async fn test_reporter_leaves_counters_untouched() {
        let session = Session::new(&Config::default());
        session.set_cache("web", "Intranet").await.unwrap();
        session.add_instance_data(InstanceKey::Hub, "hub").await.unwrap();

        let handle = spawn_stats_reporter(session.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.abort();

        let stats = session.stats().await;
        assert_eq!(stats.cache.hits, 0);
        assert_eq!(stats.cache.misses, 0);
        assert_eq!(stats.cache.total_entries, 1);
        assert_eq!(stats.instance_entries, 1);
        assert_eq!(
            session.cache_store().read().await.entry("web").unwrap().access_count,
            0
        );
    }

    #[tokio::test]
    async fn test_reporter_can_be_aborted() {
        let session = Session::new(&Config::default());

        let handle = spawn_stats_reporter(session, 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
