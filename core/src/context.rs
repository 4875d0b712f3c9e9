use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::SetupError;
use crate::executor::TaskGraphScheduler;
use crate::transport::HttpTransport;

#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn HttpTransport>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, SetupError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    pub async fn build_services(&self) -> Result<Services, SetupError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(SetupError::Config(
                "services_factory missing (cannot build transport)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }

    /// Build a scheduler wired to the configured transport.
    pub async fn build_scheduler(&self) -> Result<TaskGraphScheduler, SetupError> {
        let services = self.build_services().await?;
        Ok(TaskGraphScheduler::from_config(
            services.transport,
            &self.cfg.aggregate,
        ))
    }
}
