pub mod cli;
pub mod plan;
pub mod run;

use std::io::Read;
use std::path::Path;

use ccproxy_core::api::{AggregateRequest, CliError};

/// Read an AggregateRequest from a file, or stdin when the path is `-`.
pub fn read_request(path: &Path) -> Result<AggregateRequest, CliError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Command(format!("invalid request {}: {e}", path.display())))
}
