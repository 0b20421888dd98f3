//! Lookup result type.
//!
//! A cached `false`, `0` or `""` is a real value, so presence is carried by
//! the variant instead of by the value's truthiness.

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached<V> {
    /// The key is stored; carries the stored value.
    Present(V),
    /// The key was never set or has been cleared.
    Absent,
}

impl<V> Cached<V> {
    pub fn is_present(&self) -> bool {
        matches!(self, Cached::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        !self.is_present()
    }

    pub fn into_option(self) -> Option<V> {
        match self {
            Cached::Present(value) => Some(value),
            Cached::Absent => None,
        }
    }
}

impl<V> From<Option<V>> for Cached<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Cached::Present(value),
            None => Cached::Absent,
        }
    }
}

impl Cached<serde_json::Value> {
    /// Decodes a present value into `T`; absent stays absent.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Cached<T>> {
        match self {
            Cached::Present(value) => Ok(Cached::Present(serde_json::from_value(value)?)),
            Cached::Absent => Ok(Cached::Absent),
        }
    }
}
