#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ccproxy_core::api::{
    HttpTransport, TaskDescriptor, TransportError, TransportRequest, TransportResponse,
};
use serde_json::Value;

/// Canned downstream keyed by url path (query string ignored). Unknown paths
/// answer 404. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, (u16, Value)>,
    delays: HashMap<String, Duration>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, status: u16, body: Value) -> Self {
        self.routes.insert(path.to_string(), (status, body));
        self
    }

    pub fn delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn request_for(&self, path: &str) -> Option<TransportRequest> {
        self.requests()
            .into_iter()
            .find(|req| path_of(&req.url) == path)
    }
}

fn path_of(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        let path = path_of(&req.url).to_string();
        self.seen.lock().unwrap().push(req);

        if let Some(delay) = self.delays.get(&path) {
            tokio::time::sleep(*delay).await;
        }

        let (status, body) = self
            .routes
            .get(&path)
            .cloned()
            .unwrap_or((404, Value::Null));
        Ok(TransportResponse {
            status,
            status_text: status_text(status).to_string(),
            body,
        })
    }
}

pub fn task(id: &str, url: &str, deps: &[&str]) -> TaskDescriptor {
    TaskDescriptor::get(id, url).depends_on(deps.iter().copied())
}
