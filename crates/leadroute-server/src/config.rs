//! Server configuration

use leadroute_repository::RepositoryConfig;
use leadroute_sdk::EngineConfig;
use serde::{Deserialize, Serialize};

/// Where routing data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepositoryType {
    /// In-process store, optionally seeded from a YAML file
    Memory {
        #[serde(default)]
        seed_path: Option<String>,
    },
    /// PostgreSQL store
    Database {
        /// Connection URL; falls back to `DATABASE_URL`
        #[serde(default)]
        url: Option<String>,
    },
}

impl Default for RepositoryType {
    fn default() -> Self {
        RepositoryType::Memory { seed_path: None }
    }
}

impl RepositoryType {
    /// Convert to the repository crate's configuration
    pub fn to_repository_config(&self) -> anyhow::Result<RepositoryConfig> {
        match self {
            RepositoryType::Memory { seed_path: Some(path) } => {
                Ok(RepositoryConfig::memory_with_seed(path.clone()))
            }
            RepositoryType::Memory { seed_path: None } => Ok(RepositoryConfig::memory()),
            RepositoryType::Database { url } => {
                let url = url
                    .clone()
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| {
                        anyhow::anyhow!("Database repository requires 'url' or DATABASE_URL")
                    })?;
                Ok(RepositoryConfig::database(url))
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Repository configuration for routing data
    pub repository: RepositoryType,

    /// Engine settings (default counsellor, L3 sentinel, sweep, metrics)
    pub engine: EngineConfig,

    /// Run the reassignment sweep on a timer
    pub enable_sweep: bool,

    /// Log level
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            repository: RepositoryType::default(),
            engine: EngineConfig::default(),
            enable_sweep: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, `config/server.*` and `LEADROUTE_*` variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("LEADROUTE").separator("__"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(_) => {
                tracing::info!("No config file found, using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tracing filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim();
        let level = if level.is_empty() { "info" } else { level };
        [
            "leadroute_server",
            "leadroute_sdk",
            "leadroute_runtime",
            "leadroute_repository",
        ]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .chain(std::iter::once("tower_http=debug".to_string()))
        .collect::<Vec<_>>()
        .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_uses_configured_level() {
        let config = ServerConfig {
            log_level: "debug".to_string(),
            ..ServerConfig::default()
        };
        let filter = config.log_filter();
        assert!(filter.contains("leadroute_sdk=debug"));
        assert!(filter.contains("leadroute_server=debug"));
        assert!(filter.ends_with("tower_http=debug"));

        let blank = ServerConfig {
            log_level: " ".to_string(),
            ..ServerConfig::default()
        };
        assert!(blank.log_filter().starts_with("leadroute_server=info"));
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.enable_sweep);
        assert!(config.engine.enable_metrics);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.repository, RepositoryType::Memory { seed_path: None });
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_memory_with_seed_converts() {
        let repo = RepositoryType::Memory {
            seed_path: Some("config/routing.yaml".to_string()),
        };
        let converted = repo.to_repository_config().unwrap();
        assert_eq!(converted.seed_path.as_deref(), Some("config/routing.yaml"));
    }

    #[test]
    fn test_database_with_url_converts() {
        let repo = RepositoryType::Database {
            url: Some("postgresql://localhost/leads".to_string()),
        };
        let converted = repo.to_repository_config().unwrap();
        assert_eq!(
            converted.database_url.as_deref(),
            Some("postgresql://localhost/leads")
        );
    }
}
