use serde_json::Value;
use thiserror::Error;

/// Stable machine-readable codes surfaced to HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    CycleOrDeadlock,
    TaskFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::CycleOrDeadlock => "CYCLE_OR_DEADLOCK",
            Self::TaskFailed => "TASK_FAILED",
        }
    }
}

/// Whole-call failures of an aggregate request.
///
/// Per-task transport and business errors never surface here directly: they are
/// recorded per task and only escalate to [`AggregateError::TaskFailed`] when the
/// batch runs in strict mode.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("invalid aggregate request: {0}")]
    Validation(String),

    #[error(
        "Detected dependency cycle or deadlock in round {round}; unresolvable tasks: {}",
        pending.join(", ")
    )]
    CycleOrDeadlock { round: usize, pending: Vec<String> },

    #[error("Request {id} failed: {detail}")]
    TaskFailed { id: String, detail: Value },
}

impl AggregateError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::CycleOrDeadlock { .. } => ErrorCode::CycleOrDeadlock,
            Self::TaskFailed { .. } => ErrorCode::TaskFailed,
        }
    }
}
