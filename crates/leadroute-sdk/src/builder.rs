//! Builder pattern for RoutingEngine

use leadroute_repository::{RepositoryConfig, RepositoryLoader, RoutingRepository};
use leadroute_runtime::{DefaultCounsellor, LoggingNotifier, Notifier};
use std::sync::Arc;
use tracing::info;

use crate::config::{EngineConfig, SweepConfig};
use crate::engine::RoutingEngine;
use crate::error::{Result, SdkError};
use crate::partner::{LoggingPartnerGateway, PartnerGateway};

/// Builder for RoutingEngine
///
/// `build` opens the repository and makes sure the default counsellor exists
/// before the engine serves its first lead.
///
/// # Example
///
/// ```rust,ignore
/// use leadroute_sdk::{RepositoryConfig, RoutingEngineBuilder};
///
/// let engine = RoutingEngineBuilder::new()
///     .with_repository_config(RepositoryConfig::memory_with_seed("config/routing.yaml"))
///     .enable_metrics(true)
///     .build()
///     .await?;
/// ```
pub struct RoutingEngineBuilder {
    config: EngineConfig,
    repository: Option<Arc<dyn RoutingRepository>>,
    repository_config: Option<RepositoryConfig>,
    notifier: Option<Arc<dyn Notifier>>,
    partner: Option<Arc<dyn PartnerGateway>>,
}

impl RoutingEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            repository: None,
            repository_config: None,
            notifier: None,
            partner: None,
        }
    }

    /// Replace the whole engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already-open repository
    pub fn with_repository(mut self, repository: Arc<dyn RoutingRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Open a repository from configuration at build time
    pub fn with_repository_config(mut self, config: RepositoryConfig) -> Self {
        self.repository_config = Some(config);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_partner_gateway(mut self, partner: Arc<dyn PartnerGateway>) -> Self {
        self.partner = Some(partner);
        self
    }

    pub fn with_default_counsellor(mut self, counsellor: DefaultCounsellor) -> Self {
        self.config.default_counsellor = counsellor;
        self
    }

    pub fn with_dummy_l3_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.config.dummy_l3_agent_id = agent_id.into();
        self
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.config.sweep = sweep;
        self
    }

    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.config.enable_metrics = enable;
        self
    }

    /// Build the engine
    pub async fn build(self) -> Result<RoutingEngine> {
        let repository = match (self.repository, self.repository_config) {
            (Some(repository), _) => repository,
            (None, Some(config)) => RepositoryLoader::new(config).open().await?,
            (None, None) => {
                return Err(SdkError::Config(
                    "a repository or repository configuration is required".to_string(),
                ))
            }
        };

        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LoggingNotifier));
        let partner = self
            .partner
            .unwrap_or_else(|| Arc::new(LoggingPartnerGateway));

        let engine = RoutingEngine::new(self.config, repository, notifier, partner);
        engine.fallback().bootstrap().await?;
        info!("Routing engine ready");
        Ok(engine)
    }
}

impl Default for RoutingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadroute_repository::InMemoryRepository;

    #[tokio::test]
    async fn test_build_requires_repository() {
        let result = RoutingEngineBuilder::new().build().await;
        assert!(matches!(result, Err(SdkError::Config(_))));
    }

    #[tokio::test]
    async fn test_build_bootstraps_default_counsellor() {
        let repo = InMemoryRepository::new();
        let engine = RoutingEngineBuilder::new()
            .with_repository(Arc::new(repo.clone()))
            .with_default_counsellor(DefaultCounsellor::new(
                "fallback",
                "fallback@example.com",
                "Fallback",
            ))
            .enable_metrics(false)
            .build()
            .await
            .unwrap();

        assert!(engine.metrics().is_none());
        let stored = repo.find_counsellor_by_id("fallback").await.unwrap();
        assert_eq!(stored.map(|c| c.email), Some("fallback@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_build_from_repository_config() {
        let engine = RoutingEngineBuilder::new()
            .with_repository_config(RepositoryConfig::memory())
            .build()
            .await
            .unwrap();
        assert_eq!(engine.config().dummy_l3_agent_id, "dummy-l3-agent");
    }
}
