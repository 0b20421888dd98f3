//! Sitecache - cached, paced request coordination for content-management API clients
//!
//! A keyed memoization cache, a serial paced request queue, a coalescer that
//! combines the two, and a page-lifecycle instance registry, all owned by a
//! [`Session`].

pub mod api;
pub mod cache;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod instance;
pub mod models;
pub mod queue;
pub mod session;
pub mod tasks;
pub mod value;

mod lock;

pub use api::AppState;
pub use cache::Cached;
pub use coalesce::Fetched;
pub use config::Config;
pub use error::{CacheError, Result};
pub use instance::InstanceKey;
pub use session::Session;
pub use tasks::spawn_stats_reporter;
