//! Opens the configured repository backend

use std::sync::Arc;
use tracing::info;

use crate::config::{RepositoryConfig, RepositorySource};
use crate::error::{RepositoryError, RepositoryResult};
use crate::memory::InMemoryRepository;
use crate::traits::RoutingRepository;

/// Unified repository loader
///
/// # Example
///
/// ```rust,ignore
/// use leadroute_repository::{RepositoryConfig, RepositoryLoader};
///
/// let repo = RepositoryLoader::new(RepositoryConfig::memory_with_seed("config/routing.yaml"))
///     .open()
///     .await?;
/// ```
pub struct RepositoryLoader {
    config: RepositoryConfig,
}

impl RepositoryLoader {
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration and open the backend it names
    pub async fn open(&self) -> RepositoryResult<Arc<dyn RoutingRepository>> {
        self.config
            .validate()
            .map_err(|e| RepositoryError::Config(e.to_string()))?;

        match self.config.source {
            RepositorySource::Memory => {
                let repo = match &self.config.seed_path {
                    Some(path) => {
                        info!("Opening in-memory repository seeded from {}", path);
                        InMemoryRepository::from_yaml_file(path).await?
                    }
                    None => {
                        info!("Opening empty in-memory repository");
                        InMemoryRepository::new()
                    }
                };
                Ok(Arc::new(repo))
            }
            RepositorySource::Database => self.open_database().await,
        }
    }

    #[cfg(feature = "postgres")]
    async fn open_database(&self) -> RepositoryResult<Arc<dyn RoutingRepository>> {
        let url = self
            .config
            .database_url
            .as_deref()
            .ok_or_else(|| RepositoryError::Config("database_url is not set".to_string()))?;
        info!("Connecting to PostgreSQL repository");
        let repo = crate::postgres::PostgresRepository::new(url).await?;
        Ok(Arc::new(repo))
    }

    #[cfg(not(feature = "postgres"))]
    async fn open_database(&self) -> RepositoryResult<Arc<dyn RoutingRepository>> {
        Err(RepositoryError::Config(
            "database source requires the 'postgres' feature".to_string(),
        ))
    }
}
