//! ccproxy-cli library: modules exposed for the binary and for unit tests.

pub mod commands;
pub mod http;
