//! Unit tests for server configuration

use leadroute_server::config::{RepositoryType, ServerConfig};

#[test]
fn test_deserialize_partial_config_keeps_defaults() {
    let config: ServerConfig = serde_json::from_value(serde_json::json!({
        "port": 9090,
        "repository": { "type": "memory", "seed_path": "config/routing.yaml" },
        "engine": { "sweep": { "retry_cap": 3 } }
    }))
    .unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(
        config.repository,
        RepositoryType::Memory {
            seed_path: Some("config/routing.yaml".to_string())
        }
    );
    assert_eq!(config.engine.sweep.retry_cap, 3);
    assert_eq!(config.engine.sweep.quiet_period_secs, 600);
    assert_eq!(config.engine.dummy_l3_agent_id, "dummy-l3-agent");
}

#[test]
fn test_database_repository_type() {
    let config: ServerConfig = serde_json::from_value(serde_json::json!({
        "repository": { "type": "database", "url": "postgresql://localhost/leads" }
    }))
    .unwrap();

    let repo = config.repository.to_repository_config().unwrap();
    assert_eq!(
        repo.database_url.as_deref(),
        Some("postgresql://localhost/leads")
    );
}

#[test]
fn test_disable_sweep() {
    let config: ServerConfig =
        serde_json::from_value(serde_json::json!({ "enable_sweep": false })).unwrap();
    assert!(!config.enable_sweep);
}

#[test]
fn test_server_config_debug_format() {
    let config = ServerConfig::default();
    let debug_str = format!("{:?}", config);

    assert!(debug_str.contains("ServerConfig"));
    assert!(debug_str.contains("127.0.0.1"));
}
