//! ServicesFactory implementation: builds the transport from config for the CLI.
use async_trait::async_trait;
use ccproxy_core::api::{AppConfig, Services, ServicesFactory, SetupError};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, SetupError> {
        let transport = factory::build_transport(cfg).map_err(SetupError::Plugin)?;
        tracing::debug!(
            target: "ccproxy.transport",
            transport = transport.name(),
            base_url = ?cfg.transport.base_url,
            "transport ready"
        );
        Ok(Services { transport })
    }
}
