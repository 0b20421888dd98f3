//! Instance Module
//!
//! Page-lifecycle memoization of derived context (user, list, page, ...).

mod key;
mod registry;

pub use key::InstanceKey;
pub use registry::InstanceRegistry;
