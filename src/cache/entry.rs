//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access counting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and diagnostic metadata.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Number of counted lookups that hit this entry
    pub access_count: u64,
    /// When the entry was last written
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with a zeroed access counter.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            access_count: 0,
            created_at: Utc::now(),
        }
    }

    // == Touch ==
    /// Records a hit and returns the stored value.
    ///
    /// The counter only feeds diagnostics and saturates instead of wrapping.
    pub fn touch(&mut self) -> Value {
        self.access_count = self.access_count.saturating_add(1);
        self.value.clone()
    }
}
