use thiserror::Error;

use super::aggregate::AggregateError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("aggregate failed: {0}")]
    Aggregate(#[from] AggregateError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised while wiring services from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("config error: {0}")]
    Config(String),
    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}
