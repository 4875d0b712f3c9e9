//! HTTP API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ccproxy_core::api::AggregateError;
use serde::Serialize;
use serde_json::Value;

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    /// Body is not valid JSON or does not match the request shape.
    InvalidRequest(String),
    Aggregate(AggregateError),
    /// `/cc/proxy` surfaces the task's own error detail.
    ProxyTaskFailed(Value),
    Internal(String),
}

impl From<AggregateError> for HttpServerError {
    fn from(err: AggregateError) -> Self {
        Self::Aggregate(err)
    }
}

impl HttpServerError {
    fn parts(self) -> (StatusCode, &'static str, Value) {
        match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.into()),
            Self::Aggregate(err) => {
                let status = match &err {
                    AggregateError::Validation(_) | AggregateError::CycleOrDeadlock { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    AggregateError::TaskFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.error_code().as_str(), err.to_string().into())
            }
            Self::ProxyTaskFailed(detail) => (StatusCode::BAD_GATEWAY, "TASK_FAILED", detail),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.into(),
            ),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, error) = self.parts();

        let body = serde_json::json!({
            "success": false,
            "code": status.as_u16(),
            "error": error,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
