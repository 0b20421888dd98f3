//! Queue Module
//!
//! Serial, paced execution of remote calls with cancellation by key.

mod request_queue;

#[cfg(test)]
mod property_tests;

pub use request_queue::{QueueStats, RequestQueue};
