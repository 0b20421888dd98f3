//! Session
//!
//! Owns one cache, one request queue and one instance registry for the
//! lifetime of an application/page session, and exposes the operations entity
//! classes call. Nothing here is global: state is dropped with the session.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStats, CacheStore, Cached, SharedCache};
use crate::coalesce::{self, Coalescer, Fetched};
use crate::config::Config;
use crate::error::Result;
use crate::instance::{InstanceKey, InstanceRegistry};
use crate::queue::{QueueStats, RequestQueue};

/// Point-in-time counters for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub cache: CacheStats,
    pub queue: QueueStats,
    pub instance_entries: usize,
}

// == Session ==
/// Cheaply cloneable handle; clones share the same stores.
#[derive(Clone)]
pub struct Session {
    coalescer: Coalescer,
    instances: InstanceRegistry,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            CacheStore::shared(),
            RequestQueue::new(config.pacing()),
            InstanceRegistry::new(config.single_flight),
        )
    }

    /// Builds a session around existing stores.
    pub fn from_parts(cache: SharedCache, queue: RequestQueue, instances: InstanceRegistry) -> Self {
        Self {
            coalescer: Coalescer::new(cache, queue),
            instances,
        }
    }

    pub fn cache_store(&self) -> &SharedCache {
        self.coalescer.cache()
    }

    pub fn queue(&self) -> &RequestQueue {
        self.coalescer.queue()
    }

    // == Cache ==
    pub async fn set_cache<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.cache_store().write().await.set(key, value);
        Ok(())
    }

    /// Counted lookup.
    pub async fn is_cached(&self, key: &str) -> Cached<Value> {
        self.cache_store().write().await.is_cached(key)
    }

    /// Lookup that leaves access counters alone.
    pub async fn peek_cache(&self, key: &str) -> Cached<Value> {
        self.cache_store().read().await.peek(key)
    }

    /// Clears one key, or everything with `None`.
    pub async fn clear_cache(&self, key: Option<&str>) -> bool {
        self.cache_store().write().await.clear(key)
    }

    // == Requests ==
    pub async fn q<T, F, Fut>(&self, key: Option<&str>, producer: F) -> Result<Fetched<T>>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.coalescer.q(key, producer).await
    }

    pub async fn fetch<T, F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.coalescer.fetch(key, producer).await
    }

    pub fn qc<T, F, Fut, C>(&self, key: &str, producer: F, callback: C) -> CancellationToken
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        C: FnOnce(Result<Fetched<T>>) + Send + 'static,
    {
        self.coalescer.qc(key, producer, callback)
    }

    pub async fn time_out<T, F, Fut>(&self, producer: F, timeout: Duration, retries: u32) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        coalesce::time_out(producer, timeout, retries).await
    }

    pub async fn wait(&self, duration: Duration) {
        coalesce::wait(duration).await
    }

    // == Instance Data ==
    pub async fn add_instance_data<T: Serialize>(&self, key: InstanceKey, value: T) -> Result<bool> {
        self.instances.add_instance_data(key, value).await
    }

    pub async fn add_instance_data_check<T, F, Fut>(&self, key: InstanceKey, producer: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.instances.add_instance_data_check(key, producer).await
    }

    pub async fn clear_instance_data(&self, key: InstanceKey) -> bool {
        self.instances.clear_instance_data(key).await
    }

    pub async fn instance(&self) -> BTreeMap<InstanceKey, Value> {
        self.instances.instance().await
    }

    /// In-place navigation: drops page-scoped instance data.
    pub async fn navigate(&self) -> Vec<InstanceKey> {
        self.instances.clear_page_scoped().await
    }

    pub async fn stats(&self) -> SessionStats {
        SessionStats {
            cache: self.cache_store().read().await.stats(),
            queue: self.queue().stats(),
            instance_entries: self.instances.len().await,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
