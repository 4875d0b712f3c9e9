#[allow(clippy::module_inception)]
pub mod error;
pub mod aggregate;

pub use aggregate::{AggregateError, ErrorCode};
pub use error::{CliError, SetupError};
