use std::time::Duration;

use async_trait::async_trait;
use ccproxy_core::api::{
    HttpMethod, HttpTransport, TransportConfig, TransportError, TransportErrorKind,
    TransportRequest, TransportResponse,
};
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 512;

/// `reqwest`-backed downstream client. Owns the per-call timeout and the
/// redirect budget; non-2xx responses are returned, not raised.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    pub fn new(cfg: &TransportConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(cfg.max_redirects))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        let base_url = cfg
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string());
        Ok(Self { http, base_url })
    }

    /// Relative urls (leading `/`) are joined onto the configured base url.
    fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if url.starts_with('/') => format!("{base}{url}"),
            _ => url.to_string(),
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_request() || err.is_builder() || err.is_redirect() {
        TransportErrorKind::Request
    } else if err.is_body() {
        TransportErrorKind::Body
    } else if err.is_decode() {
        TransportErrorKind::Decode
    } else {
        TransportErrorKind::Unknown
    };
    TransportError::new(kind, err.to_string())
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

/// Empty body -> `null`, JSON -> parsed, anything else -> the raw text.
fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|err| {
        tracing::debug!(
            target: "ccproxy.transport",
            error = %err,
            body = %preview_body(body),
            "response body is not JSON; keeping it as text"
        );
        Value::String(body.to_string())
    })
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.resolve_url(&req.url);
        tracing::debug!(
            target: "ccproxy.transport",
            method = %req.method,
            url = %url,
            headers = req.headers.len(),
            has_body = req.body.is_some(),
            "dispatch"
        );

        let mut builder = self.http.request(to_reqwest_method(req.method), &url);
        let query = req.query_pairs();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            tracing::debug!(
                target: "ccproxy.transport",
                url = %url,
                status = status.as_u16(),
                body = %preview_body(&text),
                "non-success status"
            );
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: decode_body(&text),
        })
    }
}
