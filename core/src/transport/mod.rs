//! The HTTP-client collaborator seam.
//!
//! Core never talks to the network itself; a concrete [`HttpTransport`] (see the
//! plugins crate) owns connection pooling, TLS, redirects and the per-call
//! timeout.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::executor::types::{Headers, HttpMethod};

/// A fully resolved downstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Option<Map<String, Value>>,
    pub body: Option<Value>,
    pub headers: Headers,
}

impl TransportRequest {
    /// Query pairs from `params`: strings verbatim, other values as JSON text,
    /// nulls dropped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(params) = self.params.as_ref() else {
            return Vec::new();
        };
        params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Unknown,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call that produced no usable response at all.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs_render_values() {
        let params = json!({"uid": "u-1", "page": 2, "flags": [1, 2], "skip": null});
        let req = TransportRequest {
            method: HttpMethod::Get,
            url: "/o".into(),
            params: params.as_object().cloned(),
            body: None,
            headers: Headers::new(),
        };
        let pairs = req.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("flags".to_string(), "[1,2]".to_string()),
                ("page".to_string(), "2".to_string()),
                ("uid".to_string(), "u-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_success_range() {
        let mk = |status| TransportResponse {
            status,
            status_text: String::new(),
            body: Value::Null,
        };
        assert!(mk(200).is_success());
        assert!(mk(299).is_success());
        assert!(!mk(300).is_success());
        assert!(!mk(404).is_success());
    }
}
