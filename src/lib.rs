//! Catalog Client Library
//!
//! A typed client for the product and pricing backend, plus the CLI plumbing
//! used by the `catalog` binary and integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;

pub use config::{BackendConfig, ConfigError};
pub use data::{BackendClient, BackendError};
