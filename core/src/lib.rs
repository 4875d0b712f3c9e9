//! ccproxy-core: dependency-aware aggregation of declarative HTTP tasks.
//!
//! Consumers should import from [`api`] rather than reaching into modules.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod transport;
