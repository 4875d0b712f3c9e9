use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::transport::{HttpTransport, TransportRequest, TransportResponse};

use super::headers;
use super::placeholder::{self, display_value};
use super::projection;
use super::types::{ExecutionContext, ExecutionResult, Headers, TaskDescriptor};

/// Canonical business success value carried in a response body's `code` field.
pub const DEFAULT_SUCCESS_CODE: i64 = 200;

/// Runs one task against the transport. Never fails: every error is captured
/// in the returned [`ExecutionResult`].
#[derive(Clone)]
pub struct TaskExecutor {
    transport: Arc<dyn HttpTransport>,
    success_code: i64,
}

impl TaskExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            success_code: DEFAULT_SUCCESS_CODE,
        }
    }

    pub fn with_success_code(mut self, success_code: i64) -> Self {
        self.success_code = success_code;
        self
    }

    pub async fn execute(
        &self,
        task: &TaskDescriptor,
        base_headers: &Headers,
        context: &ExecutionContext,
    ) -> ExecutionResult {
        let request = build_request(task, base_headers, context);
        let method = request.method;
        let url = request.url.clone();

        let start = Instant::now();
        let outcome = self.transport.send(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    target: "ccproxy.task",
                    task_id = %task.id,
                    method = %method,
                    url = %url,
                    kind = %err.kind,
                    duration_ms,
                    "Failed {}: {}",
                    task.id,
                    err
                );
                return ExecutionResult::failed(&task.id, err.message);
            }
        };

        tracing::info!(
            target: "ccproxy.task",
            task_id = %task.id,
            "{} {} - {} - {} ({}ms)",
            method,
            url,
            response.status,
            business_code(&response.body).map(display_value).unwrap_or_default(),
            duration_ms
        );

        match self.classify(&response) {
            Ok(()) => {
                let data = match task.projection.as_ref() {
                    Some(spec) => projection::apply(response.body, spec),
                    None => response.body,
                };
                ExecutionResult::succeeded(&task.id, data)
            }
            Err(detail) => {
                tracing::error!(
                    target: "ccproxy.task",
                    task_id = %task.id,
                    status = response.status,
                    error = %detail,
                    "Failed {}",
                    task.id
                );
                ExecutionResult::failed(&task.id, detail)
            }
        }
    }

    /// Transport status first, then the business `code` embedded in the body.
    fn classify(&self, response: &TransportResponse) -> Result<(), Value> {
        if !response.is_success() {
            return Err(embedded_message(&response.body).unwrap_or_else(|| {
                Value::String(format!("HTTP {}: {}", response.status, response.status_text))
            }));
        }
        if let Some(code) = failing_business_code(&response.body, self.success_code) {
            let msg = embedded_message(&response.body)
                .map(|m| display_value(&m))
                .unwrap_or_else(|| "No message".to_string());
            return Err(Value::String(format!(
                "API Error Code {}: {}",
                display_value(code),
                msg
            )));
        }
        Ok(())
    }
}

/// Resolve placeholders and merge headers (task-level headers win).
pub fn build_request(
    task: &TaskDescriptor,
    base_headers: &Headers,
    context: &ExecutionContext,
) -> TransportRequest {
    TransportRequest {
        method: task.method,
        url: placeholder::resolve_to_string(&task.url, context),
        params: task
            .params
            .as_ref()
            .map(|params| placeholder::resolve_map(params, context)),
        body: task.body.as_ref().map(|body| placeholder::resolve(body, context)),
        headers: headers::merged(base_headers, task.headers.as_ref()),
    }
}

fn business_code(body: &Value) -> Option<&Value> {
    body.as_object()?.get("code")
}

// Absent, falsy, or equal to the success code all count as success.
fn failing_business_code(body: &Value, success_code: i64) -> Option<&Value> {
    let code = business_code(body)?;
    let passes = match code {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => {
            let n = n.as_f64();
            n == Some(0.0) || n == Some(success_code as f64)
        }
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    (!passes).then_some(code)
}

fn embedded_message(body: &Value) -> Option<Value> {
    let msg = body.as_object()?.get("msg")?;
    let empty = match msg {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(flag) => !flag,
        _ => false,
    };
    (!empty).then(|| msg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{HttpMethod, ProjectionSpec};
    use crate::transport::{TransportError, TransportErrorKind};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedTransport {
        reply: Result<TransportResponse, TransportError>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl CannedTransport {
        fn status(status: u16, status_text: &str, body: Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(TransportResponse {
                    status,
                    status_text: status_text.to_string(),
                    body,
                }),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn error(err: TransportError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        fn name(&self) -> &str {
            "canned"
        }

        async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    fn context() -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        ctx.insert("user", json!({"id": 7, "name": "ada"}));
        ctx
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let transport = CannedTransport::status(200, "OK", json!({"code": 200, "data": {"a": 1}}));
        let executor = TaskExecutor::new(transport.clone());
        let res = executor
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(res.success);
        assert_eq!(res.data, Some(json!({"code": 200, "data": {"a": 1}})));
    }

    #[tokio::test]
    async fn test_request_is_resolved_and_headers_merged() {
        let transport = CannedTransport::status(200, "OK", json!({}));
        let executor = TaskExecutor::new(transport.clone());
        let mut params = serde_json::Map::new();
        params.insert("uid".into(), json!("$user.id"));
        let task = TaskDescriptor::new("o", HttpMethod::Post, "/o/${user.name}")
            .with_params(params)
            .with_body(json!({"owner": "$user.id", "note": "for ${user.name}"}))
            .with_header("Authorization", "task");

        let mut base = Headers::new();
        base.insert("authorization".into(), "client".into());
        base.insert("app-id".into(), "9".into());

        executor.execute(&task, &base, &context()).await;

        let seen = transport.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "/o/ada");
        assert_eq!(req.params.as_ref().unwrap()["uid"], json!(7));
        assert_eq!(req.body, Some(json!({"owner": 7, "note": "for ada"})));
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("task"));
        assert_eq!(req.headers.get("app-id").map(String::as_str), Some("9"));
        assert!(!req.headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_http_status_failure() {
        let transport = CannedTransport::status(503, "Service Unavailable", json!("down"));
        let res = TaskExecutor::new(transport)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(!res.success);
        assert_eq!(res.error, Some(json!("HTTP 503: Service Unavailable")));
    }

    #[tokio::test]
    async fn test_http_failure_prefers_body_msg() {
        let transport = CannedTransport::status(400, "Bad Request", json!({"msg": "uid required"}));
        let res = TaskExecutor::new(transport)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert_eq!(res.error, Some(json!("uid required")));
    }

    #[tokio::test]
    async fn test_business_error_code() {
        let transport = CannedTransport::status(200, "OK", json!({"code": 4001, "msg": "no such user"}));
        let res = TaskExecutor::new(transport)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(!res.success);
        assert_eq!(res.error, Some(json!("API Error Code 4001: no such user")));
    }

    #[tokio::test]
    async fn test_business_error_without_message() {
        let transport = CannedTransport::status(200, "OK", json!({"code": "E1"}));
        let res = TaskExecutor::new(transport)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert_eq!(res.error, Some(json!("API Error Code E1: No message")));
    }

    #[tokio::test]
    async fn test_zero_code_and_custom_success_code() {
        let zero = CannedTransport::status(200, "OK", json!({"code": 0, "data": {}}));
        let res = TaskExecutor::new(zero)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(res.success);

        let custom = CannedTransport::status(200, "OK", json!({"code": 1000}));
        let res = TaskExecutor::new(custom)
            .with_success_code(1000)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(res.success);
    }

    #[tokio::test]
    async fn test_transport_error_is_captured() {
        let transport = CannedTransport::error(TransportError::new(
            TransportErrorKind::Timeout,
            "timeout of 10000ms exceeded",
        ));
        let res = TaskExecutor::new(transport)
            .execute(&TaskDescriptor::get("t", "/t"), &Headers::new(), &context())
            .await;
        assert!(!res.success);
        assert_eq!(res.error, Some(json!("timeout of 10000ms exceeded")));
    }

    #[tokio::test]
    async fn test_projection_applied_on_success_only() {
        let ok = CannedTransport::status(200, "OK", json!({"code": 200, "data": {"a": 1, "b": 2}}));
        let task = TaskDescriptor::get("t", "/t").with_projection(ProjectionSpec::include(["a"]));
        let res = TaskExecutor::new(ok).execute(&task, &Headers::new(), &context()).await;
        assert_eq!(res.data, Some(json!({"code": 200, "data": {"a": 1}})));

        let bad = CannedTransport::status(500, "Internal Server Error", json!({"data": {"a": 1}}));
        let res = TaskExecutor::new(bad).execute(&task, &Headers::new(), &context()).await;
        assert_eq!(res.data, None);
        assert_eq!(res.error, Some(json!("HTTP 500: Internal Server Error")));
    }
}
