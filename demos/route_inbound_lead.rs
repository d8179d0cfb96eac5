//! Inbound lead routing example
//!
//! This example demonstrates:
//! - Building a RoutingEngine over the seeded in-memory repository
//! - Routing raw lead payloads with inconsistent keys
//! - Persisting an assignment and reading its audit log
//! - Handing a lead to an L3 counsellor

use leadroute_core::{ConditionNormalizer, CourseField, L3Query};
use leadroute_sdk::{RepositoryConfig, RoutingEngineBuilder};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadroute_sdk=info".into()),
        )
        .init();

    println!("=== Inbound Lead Routing Example ===\n");

    let engine = RoutingEngineBuilder::new()
        .with_repository_config(RepositoryConfig::memory_with_seed("config/routing.yaml"))
        .build()
        .await?;

    let payloads = [
        json!({
            "Full Name": "Priya Sharma",
            "email_id": "priya@example.com",
            "mobile": "9876543210",
            "city": ["Delhi"],
            "study-mode": "Online"
        }),
        json!({
            "name": "Dev Patel",
            "email": "dev@example.com",
            "phone": "9123456780",
            "landing_page_url": "https://apply.example.com/mba?utm_campaign=diwali_2026&utm_source=google"
        }),
        json!({
            "name": "Neha Gupta",
            "email": "neha@example.com",
            "phone": "9988776655",
            "city": "Chennai"
        }),
    ];

    for (i, payload) in payloads.iter().enumerate() {
        let Some(raw) = payload.as_object() else {
            continue;
        };
        let result = engine.route_raw(raw).await?;
        println!("Lead #{}:", i + 1);
        println!("  Target: {}", result.target_id);
        println!("  Method: {}", result.method);
        println!("  Rule: {}", result.rule_id.as_deref().unwrap_or("-"));
        if let Some(score) = result.score {
            println!("  Score: {}", score);
        }
        if let Some(reason) = &result.reason {
            println!("  Reason: {}", reason);
        }
        println!();
    }

    let lead = ConditionNormalizer::normalize_value(&payloads[0]);
    let assignment = engine.assign_lead("lead-1001", &lead).await?;
    println!(
        "Persisted lead-1001 -> {} (reassignment: {})",
        assignment.result.target_id,
        assignment.is_reassignment()
    );
    for entry in engine.repository().assignment_logs("lead-1001").await? {
        println!("  log: {} by {} ({})", entry.target_id, entry.assigned_by, entry.reason);
    }

    let query = L3Query::new("Alpha University", "Google").with_course(CourseField::Degree, "MBA");
    let l3 = engine.route_l3(&query).await?;
    println!(
        "\nL3 handoff -> {} via {} at level {}",
        l3.target_id,
        l3.method,
        l3.matched_at_level.as_deref().unwrap_or("-")
    );

    if let Some(metrics) = engine.metrics() {
        println!("\nMetrics:");
        for (name, value) in metrics.snapshot().counters {
            println!("  {}: {}", name, value);
        }
    }

    Ok(())
}
