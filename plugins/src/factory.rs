use std::sync::Arc;

use anyhow::Result;

use ccproxy_core::api::{AppConfig, HttpTransport};

use crate::transport::ReqwestTransport;

pub fn build_transport(cfg: &AppConfig) -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(ReqwestTransport::new(&cfg.transport)?))
}
