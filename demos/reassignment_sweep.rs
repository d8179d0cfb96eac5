//! Reassignment sweep example
//!
//! Seeds a few unopened leads, runs sweep cycles by hand and prints each
//! cycle's per-lead outcomes.

use chrono::{Duration, Utc};
use leadroute_core::{Lead, LeadField, LeadIdentity};
use leadroute_repository::{InMemoryRepository, LeadActivity, LeadRecord, RoutingRepository};
use leadroute_sdk::{ReassignmentSweep, RoutingEngineBuilder};
use std::sync::Arc;

const SEED: &str = r#"
counsellors:
  - { id: c-asha, name: Asha Nair, email: asha@leadroute.local, role: l2, status: active }
  - { id: c-ravi, name: Ravi Kumar, email: ravi@leadroute.local, role: l2, status: active }
rules:
  - id: pune
    tier: l2
    conditions: { preferred_city: [Pune] }
    assigned_counsellor_ids: [c-asha]
  - id: mumbai
    tier: l2
    conditions: { preferred_city: [Mumbai] }
    assigned_counsellor_ids: [c-ravi]
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadroute_sdk=info".into()),
        )
        .init();

    println!("=== Reassignment Sweep Example ===\n");

    let repo = InMemoryRepository::from_yaml(SEED)?;
    let engine = RoutingEngineBuilder::new()
        .with_repository(Arc::new(repo.clone()))
        .build()
        .await?;
    let sweep = ReassignmentSweep::new(Arc::new(engine));

    let now = Utc::now();
    let assigned_at = now - Duration::hours(1);
    let leads = [
        ("lead-pune", "c-asha", Some("Pune")),
        ("lead-mumbai", "c-asha", Some("Mumbai")),
        ("lead-silent", "c-ravi", None),
    ];
    for (lead_id, counsellor, city) in leads {
        repo.save_lead(&LeadRecord::new(lead_id, assigned_at).assigned_to(counsellor, assigned_at))
            .await?;
        if let Some(city) = city {
            let snapshot = Lead::new(LeadIdentity::new("Student", "student@example.com", "9000000000"))
                .with(LeadField::PreferredCity, city);
            repo.record_lead_activity(&LeadActivity {
                lead_id: lead_id.to_string(),
                recorded_at: assigned_at,
                snapshot,
            })
            .await?;
        }
    }

    for cycle in 1..=3 {
        let report = sweep.run_once(now + Duration::minutes(5 * cycle)).await?;
        println!("Cycle {}:", cycle);
        for result in &report.results {
            println!("  {} -> {:?}", result.lead_id, result.outcome);
        }
        println!();
    }

    Ok(())
}
