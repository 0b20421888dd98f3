//! Instance keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Page-session values the registry memoizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceKey {
    Context,
    User,
    Profile,
    List,
    Item,
    Page,
    ParentPage,
    Hub,
    Webs,
}

impl InstanceKey {
    pub const COUNT: usize = 9;

    pub const ALL: [InstanceKey; Self::COUNT] = [
        InstanceKey::Context,
        InstanceKey::User,
        InstanceKey::Profile,
        InstanceKey::List,
        InstanceKey::Item,
        InstanceKey::Page,
        InstanceKey::ParentPage,
        InstanceKey::Hub,
        InstanceKey::Webs,
    ];

    /// Keys that describe the current page and go stale on in-place navigation.
    pub fn is_page_scoped(self) -> bool {
        matches!(
            self,
            InstanceKey::Item | InstanceKey::List | InstanceKey::Page | InstanceKey::ParentPage
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstanceKey::Context => "context",
            InstanceKey::User => "user",
            InstanceKey::Profile => "profile",
            InstanceKey::List => "list",
            InstanceKey::Item => "item",
            InstanceKey::Page => "page",
            InstanceKey::ParentPage => "parentPage",
            InstanceKey::Hub => "hub",
            InstanceKey::Webs => "webs",
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstanceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown instance key: {s}")))
    }
}
