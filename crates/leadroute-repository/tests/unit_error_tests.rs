//! Unit tests for RepositoryError types and error handling

use leadroute_core::CoreError;
use leadroute_repository::{RepositoryConfig, RepositoryError, RepositoryLoader, RepositorySource};

#[test]
fn test_error_not_found_display() {
    let error = RepositoryError::NotFound {
        kind: "lead",
        id: "lead-42".to_string(),
    };

    assert_eq!(error.to_string(), "lead not found: lead-42");
}

#[test]
fn test_error_invalid_from_core() {
    let error: RepositoryError = CoreError::InvalidRule {
        rule_id: "r1".to_string(),
        reason: "no conditions".to_string(),
    }
    .into();

    assert!(matches!(error, RepositoryError::Invalid(_)));
    assert!(error.to_string().starts_with("Invalid record:"));
    assert!(error.to_string().contains("r1"));
}

#[test]
fn test_error_yaml_parse() {
    let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("key: [unclosed").unwrap_err();
    let error: RepositoryError = yaml_err.into();

    assert!(error.to_string().contains("Failed to parse YAML"));
}

#[test]
fn test_error_io_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "seed.yaml missing");
    let error: RepositoryError = io_err.into();

    assert!(matches!(error, RepositoryError::Io(_)));
    assert!(error.to_string().contains("seed.yaml missing"));
}

#[test]
fn test_error_config_display() {
    let error = RepositoryError::Config("database_url is not set".to_string());

    assert_eq!(
        error.to_string(),
        "Configuration error: database_url is not set"
    );
}

#[tokio::test]
async fn test_loader_rejects_database_without_url() {
    let config = RepositoryConfig {
        source: RepositorySource::Database,
        seed_path: None,
        database_url: None,
    };

    let result = RepositoryLoader::new(config).open().await;
    assert!(matches!(result, Err(RepositoryError::Config(_))));
}

#[tokio::test]
async fn test_loader_missing_seed_file() {
    let config = RepositoryConfig::memory_with_seed("/nonexistent/routing.yaml");

    let result = RepositoryLoader::new(config).open().await;
    assert!(matches!(result, Err(RepositoryError::Io(_))));
}
