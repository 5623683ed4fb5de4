//! In-memory memoization for backend lookups
//!
//! Holds results for a short, fixed lifetime and a fixed number of keys so
//! repeated lookups within a burst of requests skip the network.

mod manager;

pub use manager::CacheManager;
