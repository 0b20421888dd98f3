//! Instance Registry
//!
//! Memoizes page-session values (current user, list, page, hub, ...) so each
//! is computed once per page lifecycle. Entries stay until explicitly cleared.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::instance::InstanceKey;
use crate::value::is_falsy;

struct Inner {
    values: RwLock<BTreeMap<InstanceKey, Value>>,
    /// One async mutex per key, indexed by discriminant.
    flights: [Mutex<()>; InstanceKey::COUNT],
    single_flight: bool,
}

// == Instance Registry ==
/// Lazily computed, explicitly invalidated page-session values.
///
/// With `single_flight` enabled, concurrent [`add_instance_data_check`] calls
/// for one key run one producer at a time and later callers reuse the stored
/// result. Without it, every concurrent caller that saw the key unset runs its
/// own producer and the last to finish wins.
///
/// [`add_instance_data_check`]: InstanceRegistry::add_instance_data_check
#[derive(Clone)]
pub struct InstanceRegistry {
    inner: Arc<Inner>,
}

impl InstanceRegistry {
    pub fn new(single_flight: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                values: RwLock::new(BTreeMap::new()),
                flights: std::array::from_fn(|_| Mutex::new(())),
                single_flight,
            }),
        }
    }

    // == Add ==
    /// Stores `value` unless it is falsy (`null`, `false`, `0`, `""`).
    ///
    /// Returns whether the value was stored; a falsy value never replaces an
    /// existing entry.
    pub async fn add_instance_data<T: Serialize>(&self, key: InstanceKey, value: T) -> Result<bool> {
        let value = serde_json::to_value(value)?;
        if is_falsy(&value) {
            debug!(key = %key, "ignoring falsy instance data");
            return Ok(false);
        }
        self.inner.values.write().await.insert(key, value);
        Ok(true)
    }

    // == Add With Check ==
    /// Returns the stored value for `key`, computing it with `producer` if unset.
    ///
    /// Any stored value counts, falsy ones included, and so does a falsy
    /// producer result. A stored value that does not decode as `T` is treated
    /// as unset and replaced by the producer's result. A producer error is
    /// logged and yields `None`; the key stays as it was so the next call runs
    /// a producer again.
    pub async fn add_instance_data_check<T, F, Fut>(&self, key: InstanceKey, producer: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(value) = self.stored_as(key).await {
            return Some(value);
        }

        let _flight = if self.inner.single_flight {
            Some(self.inner.flights[key as usize].lock().await)
        } else {
            None
        };

        if self.inner.single_flight {
            if let Some(value) = self.stored_as(key).await {
                debug!(key = %key, "instance data filled by concurrent caller");
                return Some(value);
            }
        }

        match producer().await {
            Ok(result) => {
                match serde_json::to_value(&result) {
                    Ok(value) => {
                        self.inner.values.write().await.insert(key, value);
                    }
                    Err(err) => warn!(key = %key, error = %err, "instance data is not storable"),
                }
                Some(result)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "instance producer failed, key left unset");
                None
            }
        }
    }

    /// Decodes the stored value for `key`, if any.
    pub async fn get_instance_data<T: DeserializeOwned>(&self, key: InstanceKey) -> Result<Option<T>> {
        match self.stored(key).await {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn stored(&self, key: InstanceKey) -> Option<Value> {
        self.inner.values.read().await.get(&key).cloned()
    }

    /// Stored value decoded as `T`; `None` when unset or of another shape.
    async fn stored_as<T: DeserializeOwned>(&self, key: InstanceKey) -> Option<T> {
        let value = self.stored(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key = %key, error = %err, "stored instance data has an unexpected shape, recomputing");
                None
            }
        }
    }

    // == Clear ==
    /// Removes `key`; returns whether it was set.
    pub async fn clear_instance_data(&self, key: InstanceKey) -> bool {
        let removed = self.inner.values.write().await.remove(&key).is_some();
        debug!(key = %key, removed, "instance data cleared");
        removed
    }

    /// Clears the page-scoped keys after in-place navigation.
    ///
    /// Site and tenant values (`context`, `user`, `profile`, `hub`, `webs`)
    /// are kept. Returns the keys that were set.
    pub async fn clear_page_scoped(&self) -> Vec<InstanceKey> {
        let mut values = self.inner.values.write().await;
        let removed: Vec<InstanceKey> = InstanceKey::ALL
            .into_iter()
            .filter(|key| key.is_page_scoped() && values.remove(key).is_some())
            .collect();
        debug!(removed = ?removed, "page-scoped instance data cleared");
        removed
    }

    // == Snapshot ==
    /// Read-only copy of every stored value.
    pub async fn instance(&self) -> BTreeMap<InstanceKey, Value> {
        self.inner.values.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
