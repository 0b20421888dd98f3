//! Coalesce Module
//!
//! Cached, queued producer calls (`q`, `qc`, `fetch`) plus the standalone
//! deadline/retry helpers.

mod coalescer;
mod retry;

pub use coalescer::{Coalescer, Fetched};
pub use retry::{time_out, wait};
