//! Repository configuration types
//!
//! Selects between the in-memory store (optionally seeded from YAML) and the
//! PostgreSQL store.

use serde::{Deserialize, Serialize};

/// Repository source type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositorySource {
    /// Process-local store
    #[default]
    Memory,
    /// PostgreSQL database
    Database,
}

/// Repository configuration
///
/// # Examples
///
/// ```rust
/// use leadroute_repository::RepositoryConfig;
///
/// // Empty in-memory repository
/// let config = RepositoryConfig::memory();
///
/// // In-memory repository seeded from YAML
/// let config = RepositoryConfig::memory_with_seed("config/routing.yaml");
///
/// // Database repository
/// let config = RepositoryConfig::database("postgresql://localhost/leadroute");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Configuration source type
    #[serde(default)]
    pub source: RepositorySource,

    /// YAML seed file for the memory source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<String>,

    /// Database connection URL (required for Database source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl RepositoryConfig {
    /// Create an empty memory repository configuration
    pub fn memory() -> Self {
        Self {
            source: RepositorySource::Memory,
            seed_path: None,
            database_url: None,
        }
    }

    /// Create a memory repository configuration seeded from a YAML file
    pub fn memory_with_seed(path: impl Into<String>) -> Self {
        Self {
            seed_path: Some(path.into()),
            ..Self::memory()
        }
    }

    /// Create a database repository configuration
    ///
    /// # Example
    /// ```rust
    /// use leadroute_repository::RepositoryConfig;
    ///
    /// let config = RepositoryConfig::database("postgresql://localhost/leadroute");
    /// assert_eq!(config.database_url.as_deref(), Some("postgresql://localhost/leadroute"));
    /// ```
    pub fn database(url: impl Into<String>) -> Self {
        Self {
            source: RepositorySource::Database,
            seed_path: None,
            database_url: Some(url.into()),
        }
    }

    /// Validate the configuration
    ///
    /// Returns an error if required fields are missing for the selected source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.source {
            RepositorySource::Database => {
                if self.database_url.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingField {
                        source: "Database".to_string(),
                        field: "database_url".to_string(),
                    });
                }
                if !cfg!(feature = "postgres") {
                    return Err(ConfigError::FeatureDisabled("postgres".to_string()));
                }
            }
            RepositorySource::Memory => {}
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is missing for the selected source
    MissingField { source: String, field: String },
    /// The selected source needs a cargo feature that is not compiled in
    FeatureDisabled(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingField { source, field } => {
                write!(f, "{} source requires {} to be set", source, field)
            }
            ConfigError::FeatureDisabled(feature) => {
                write!(f, "the '{}' feature is not enabled", feature)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
