use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::ExecutionContext;

/// Error detail recorded for a task that was never dispatched because one of
/// its prerequisites failed.
pub const DEPENDENCY_FAILED: &str = "dependency failed";

/// Outcome of one task run. Transient, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub id: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<Value>,
}

impl ExecutionResult {
    pub fn succeeded(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn skipped(id: impl Into<String>) -> Self {
        Self::failed(id, DEPENDENCY_FAILED)
    }
}

/// Wire response of an aggregate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub success: bool,
    pub data: ExecutionContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
}

impl AggregateResponse {
    pub fn from_parts(data: ExecutionContext, errors: Map<String, Value>) -> Self {
        Self {
            success: errors.is_empty(),
            data,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}

/// What happened in one scheduling round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundTrace {
    pub round: usize,
    /// Ids dispatched to the transport, in batch order.
    pub executed: Vec<String>,
    /// Ids recorded as failed without a call because a prerequisite failed.
    pub skipped: Vec<String>,
}

/// Response plus the round-by-round trace, for logging and the CLI.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub run_id: String,
    pub response: AggregateResponse,
    pub rounds: Vec<RoundTrace>,
    pub duration_ms: u64,
}
