//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a session is served.
//!
//! # Tasks
//! - Stats reporter: logs cache, queue and registry counters at a fixed interval

mod reporter;

pub use reporter::spawn_stats_reporter;
