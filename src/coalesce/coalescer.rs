//! Coalescer
//!
//! Single entry point that is both cached and queued: a key already in the
//! cache short-circuits, anything else goes through the paced queue and its
//! result is written back to the cache.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{Cached, SharedCache};
use crate::error::{CacheError, Result};
use crate::queue::RequestQueue;

// == Fetched ==
/// Outcome of [`Coalescer::q`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The key was already cached; the value is not returned.
    Cached,
    /// The producer ran and returned this value.
    Fresh(T),
}

impl<T> Fetched<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self, Fetched::Cached)
    }

    pub fn into_fresh(self) -> Option<T> {
        match self {
            Fetched::Fresh(value) => Some(value),
            Fetched::Cached => None,
        }
    }
}

// == Coalescer ==
/// Cache-then-queue front door for producer calls.
#[derive(Clone)]
pub struct Coalescer {
    cache: SharedCache,
    queue: RequestQueue,
}

impl Coalescer {
    pub fn new(cache: SharedCache, queue: RequestQueue) -> Self {
        Self { cache, queue }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    // == Q ==
    /// Runs `producer` through the queue unless `key` is already cached.
    ///
    /// On a hit this returns [`Fetched::Cached`] without the value; read it
    /// from the cache or use [`fetch`](Self::fetch). With `key = None` nothing
    /// is looked up or stored. A producer error is returned as-is and leaves the
    /// cache untouched.
    pub async fn q<T, F, Fut>(&self, key: Option<&str>, producer: F) -> Result<Fetched<T>>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.q_with_token(key, None, producer).await
    }

    async fn q_with_token<T, F, Fut>(
        &self,
        key: Option<&str>,
        token: Option<CancellationToken>,
        producer: F,
    ) -> Result<Fetched<T>>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        if let Some(key) = key {
            if self.cache.write().await.is_cached(key).is_present() {
                debug!(key, "served from cache");
                return Ok(Fetched::Cached);
            }
        }

        let cache = self.cache.clone();
        let owned_key = key.map(str::to_owned);
        self.queue
            .enqueue_with_token(key, token, move || async move {
                // An earlier entry for the same key may have filled the cache
                // while this one was waiting.
                if let Some(key) = owned_key.as_deref() {
                    if cache.read().await.peek(key).is_present() {
                        debug!(key, "filled while queued, skipping producer");
                        return Ok(Fetched::Cached);
                    }
                }

                let value = match producer().await {
                    Ok(value) => value,
                    Err(err) => return Err(err),
                };

                if let Some(key) = owned_key {
                    match serde_json::to_value(&value) {
                        Ok(stored) => cache.write().await.set(key, stored),
                        Err(err) => warn!(key = %key, error = %err, "result is not cacheable"),
                    }
                }
                Ok(Fetched::Fresh(value))
            })
            .await
    }

    // == Fetch ==
    /// Like [`q`](Self::q), but always yields the value, decoding it from the
    /// cache on a hit.
    pub async fn fetch<T, F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        match self.q(Some(key), producer).await? {
            Fetched::Fresh(value) => Ok(value),
            Fetched::Cached => match self.cache.read().await.peek(key).decode::<T>()? {
                Cached::Present(value) => Ok(value),
                // Cleared between the hit and this read.
                Cached::Absent => Err(CacheError::NotFound(key.to_string())),
            },
        }
    }

    // == QC ==
    /// Fire-and-forget [`q`](Self::q): the outcome goes to `callback`.
    ///
    /// Cancelling the returned token before the queued producer starts skips
    /// it; `callback` then receives [`CacheError::Cancelled`]. A producer that
    /// already started runs to completion.
    pub fn qc<T, F, Fut, C>(&self, key: &str, producer: F, callback: C) -> CancellationToken
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        C: FnOnce(Result<Fetched<T>>) + Send + 'static,
    {
        let token = CancellationToken::new();
        let coalescer = self.clone();
        let key = key.to_string();
        let entry_token = token.clone();

        tokio::spawn(async move {
            let result = coalescer
                .q_with_token(Some(&key), Some(entry_token), producer)
                .await;
            callback(result);
        });

        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn coalescer() -> Coalescer {
        Coalescer::new(CacheStore::shared(), RequestQueue::new(Duration::from_millis(1)))
    }

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> futures::future::Ready<anyhow::Result<String>> + Send + 'static {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(value.to_string()))
        }
    }

    #[tokio::test]
    async fn test_q_caches_result() {
        let coalescer = coalescer();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coalescer
            .q(Some("web/title"), counting_producer(&calls, "Intranet"))
            .await
            .unwrap();
        let second = coalescer
            .q(Some("web/title"), counting_producer(&calls, "Other"))
            .await
            .unwrap();

        assert_eq!(first, Fetched::Fresh("Intranet".to_string()));
        assert_eq!(second, Fetched::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            coalescer.cache().read().await.peek("web/title"),
            Cached::Present(json!("Intranet"))
        );
    }

    #[tokio::test]
    async fn test_q_without_key_never_caches() {
        let coalescer = coalescer();
        let calls = Arc::new(AtomicUsize::new(0));

        coalescer.q(None, counting_producer(&calls, "a")).await.unwrap();
        let second = coalescer.q(None, counting_producer(&calls, "b")).await.unwrap();

        assert_eq!(second, Fetched::Fresh("b".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(coalescer.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_q_falsy_cached_value_is_hit() {
        let coalescer = coalescer();
        coalescer.cache().write().await.set("has_access", json!(false));
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = coalescer
            .q(Some("has_access"), counting_producer(&calls, "unused"))
            .await
            .unwrap();

        assert!(outcome.is_cached());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_q_same_key_runs_producer_once() {
        let coalescer = coalescer();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            coalescer.q(Some("list/items"), counting_producer(&calls, "first")),
            coalescer.q(Some("list/items"), counting_producer(&calls, "second")),
        );

        assert_eq!(a.unwrap(), Fetched::Fresh("first".to_string()));
        assert_eq!(b.unwrap(), Fetched::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_q_failure_not_cached() {
        let coalescer = coalescer();

        let failed = coalescer
            .q(Some("user"), || async { Err::<String, _>(anyhow::anyhow!("401")) })
            .await;
        assert!(matches!(failed, Err(CacheError::Producer(_))));
        assert!(coalescer.cache().read().await.peek("user").is_absent());

        let retried = coalescer
            .q(Some("user"), || async { Ok("jane".to_string()) })
            .await
            .unwrap();
        assert_eq!(retried.into_fresh(), Some("jane".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_returns_cached_value() {
        let coalescer = coalescer();
        let calls = Arc::new(AtomicUsize::new(0));

        let first: String = coalescer
            .fetch("page/title", counting_producer(&calls, "Home"))
            .await
            .unwrap();
        let second: String = coalescer
            .fetch("page/title", counting_producer(&calls, "Other"))
            .await
            .unwrap();

        assert_eq!(first, "Home");
        assert_eq!(second, "Home");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_qc_delivers_to_callback() {
        let coalescer = coalescer();
        let (tx, rx) = oneshot::channel();

        let _token = coalescer.qc(
            "hub",
            || async { Ok(json!({"Url": "/sites/hub"})) },
            move |result| {
                let _ = tx.send(result);
            },
        );

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result, Fetched::Fresh(json!({"Url": "/sites/hub"})));
    }

    #[tokio::test]
    async fn test_qc_cancel_before_start() {
        let coalescer = coalescer();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();

        let token = coalescer.qc(
            "webs",
            counting_producer(&calls, "subsites"),
            move |result| {
                let _ = tx.send(result);
            },
        );
        token.cancel();

        assert!(matches!(rx.await.unwrap(), Err(CacheError::Cancelled(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(coalescer.cache().read().await.peek("webs").is_absent());
    }
}
