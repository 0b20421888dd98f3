//! Response DTOs for the diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats};
use crate::instance::InstanceKey;
use crate::queue::QueueStats;
use crate::session::SessionStats;

/// Response body for a cache peek (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Counted lookups since the entry was written
    pub access_count: u64,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

impl CacheEntryResponse {
    pub fn new(key: impl Into<String>, entry: &CacheEntry) -> Self {
        Self {
            key: key.into(),
            value: entry.value.clone(),
            access_count: entry.access_count,
            created_at: entry.created_at,
        }
    }
}

/// Response body for PUT /cache
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cached", key),
            key,
        }
    }
}

/// Response body for DELETE /cache and DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// The cleared key, `None` when the whole cache was cleared
    pub key: Option<String>,
}

impl ClearResponse {
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cleared", key),
            key: Some(key),
        }
    }

    pub fn all() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            key: None,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub queue: QueueStats,
    pub instance_entries: usize,
}

impl From<SessionStats> for StatsResponse {
    fn from(stats: SessionStats) -> Self {
        Self {
            hit_rate: stats.cache.hit_rate(),
            cache: stats.cache,
            queue: stats.queue,
            instance_entries: stats.instance_entries,
        }
    }
}

/// Response body for GET /instance
#[derive(Debug, Clone, Serialize)]
pub struct InstanceResponse {
    pub entries: BTreeMap<InstanceKey, Value>,
}

/// Response body for DELETE /instance and DELETE /instance/:key
#[derive(Debug, Clone, Serialize)]
pub struct InstanceClearResponse {
    /// Keys that held a value and were removed
    pub cleared: Vec<InstanceKey>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_response_serialize() {
        let mut entry = CacheEntry::new(json!(0));
        entry.touch();
        let resp = CacheEntryResponse::new("item_count", &entry);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "item_count");
        assert_eq!(json["value"], 0);
        assert_eq!(json["access_count"], 1);
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_clear_response_serialize() {
        let json = serde_json::to_value(ClearResponse::key("user")).unwrap();
        assert_eq!(json["key"], "user");

        let json = serde_json::to_value(ClearResponse::all()).unwrap();
        assert!(json["key"].is_null());
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let mut cache = CacheStats::new();
        for _ in 0..4 {
            cache.record_hit();
        }
        cache.record_miss();

        let resp = StatsResponse::from(SessionStats {
            cache,
            queue: QueueStats::default(),
            instance_entries: 2,
        });
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.instance_entries, 2);
    }

    #[test]
    fn test_instance_clear_response_serialize() {
        let resp = InstanceClearResponse {
            cleared: vec![InstanceKey::Item, InstanceKey::ParentPage],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"cleared":["item","parentPage"]}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
