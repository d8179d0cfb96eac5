//! Integration tests for request-driven routing

mod common;

use common::{identity, lead, TestEngine};
use leadroute_core::{CourseField, L3Query, Lead, LeadField, LeadIdentity};
use leadroute_repository::RoutingRepository;
use leadroute_runtime::AssignmentKind;
use leadroute_sdk::{AssignmentMethod, PartnerError, PartnerGateway, PartnerReceipt, SdkError};
use serde_json::json;
use std::sync::Arc;

const SEED: &str = r#"
counsellors:
  - { id: c1, name: Asha, email: asha@example.com, role: l2, status: active }
  - { id: c2, name: Ravi, email: ravi@example.com, role: l2, status: active }
  - { id: c3, name: Kiran, email: kiran@example.com, role: l2, status: inactive }
  - { id: l3a, name: Meera, email: meera@example.com, role: l3, status: active }
  - { id: l3b, name: Arjun, email: arjun@example.com, role: l3, status: active }
rules:
  - id: delhi_online
    tier: l2
    conditions: { preferred_city: [Delhi], mode: [Online] }
    assigned_counsellor_ids: [c1, c2]
  - id: diwali_campaign
    tier: l2
    conditions: { utmCampaign: [diwali] }
    assigned_counsellor_ids: [c2]
  - id: budget_band
    tier: l2
    conditions: { preferred_budget: "50000-100000", preferred_state: Any }
    assigned_counsellor_ids: [c1]
  - id: offline_only
    tier: l2
    conditions: { mode: [Offline] }
    assigned_counsellor_ids: [c3]
  - id: recon_mba
    tier: recon
    conditions: { preferred_degree: [MBA] }
    assigned_university_names: [Alpha University, Beta University]
l3_rules:
  - id: alpha_generic
    university_name: [Alpha University]
    source: [Google]
    assigned_counsellor_ids: [l3a]
    priority: 1
  - id: alpha_mba
    university_name: [Alpha University]
    source: [Google]
    course_conditions: { degree: [MBA] }
    assigned_counsellor_ids: [l3b]
  - id: beta_pool
    university_name: [Beta University]
    source: [Facebook]
    assigned_counsellor_ids: [l3a, l3b]
"#;

#[tokio::test]
async fn test_delhi_online_lead_goes_round_robin_and_persists_index() {
    let (engine, repo) = TestEngine::new(SEED).build().await;

    let raw = json!({
        "name": "Priya",
        "email": "priya@example.com",
        "phone": "9876543210",
        "preferredCity": ["Delhi"],
        "source": "Google",
        "mode": "Online"
    });
    let result = engine.route_raw(raw.as_object().unwrap()).await.unwrap();

    assert_eq!(result.target_id, "c1");
    assert_eq!(result.method, AssignmentMethod::RoundRobin);
    assert_eq!(result.rule_id.as_deref(), Some("delhi_online"));
    assert_eq!(
        result.matched_fields,
        vec![LeadField::Mode, LeadField::PreferredCity]
    );

    let rule = repo.rule("delhi_online").await.unwrap();
    assert_eq!(rule.round_robin_index, 1);
    assert_eq!(rule.match_count, 1);
    assert!(rule.last_matched_at.is_some());
}

#[tokio::test]
async fn test_round_robin_cycles_every_target() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let delhi = lead()
        .with(LeadField::PreferredCity, "Delhi")
        .with(LeadField::Mode, "Online");

    let mut picks = Vec::new();
    for _ in 0..4 {
        picks.push(engine.route_lead(&delhi).await.unwrap().target_id);
    }
    assert_eq!(picks, vec!["c1", "c2", "c1", "c2"]);
}

#[tokio::test]
async fn test_campaign_match_outranks_city_and_mode() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let contested = lead()
        .with(LeadField::UtmCampaign, "diwali")
        .with(LeadField::PreferredCity, "Delhi")
        .with(LeadField::Mode, "Online");

    let result = engine.route_lead(&contested).await.unwrap();
    assert_eq!(result.rule_id.as_deref(), Some("diwali_campaign"));
    assert_eq!(result.target_id, "c2");
}

#[tokio::test]
async fn test_any_state_and_budget_band() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;

    for state in [None, Some("Kerala"), Some("Punjab")] {
        let mut budget_lead = lead().with(LeadField::PreferredBudget, "75000");
        if let Some(state) = state {
            budget_lead = budget_lead.with(LeadField::PreferredState, state);
        }
        let result = engine.route_lead(&budget_lead).await.unwrap();
        assert_eq!(result.rule_id.as_deref(), Some("budget_band"), "state {:?}", state);
    }

    let outside = lead().with(LeadField::PreferredBudget, "120000");
    let result = engine.route_lead(&outside).await.unwrap();
    assert_eq!(result.method, AssignmentMethod::Default);
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let (engine, repo) = TestEngine::new(SEED).build().await;
    let anonymous = Lead::new(LeadIdentity::new("Priya", "", "9876543210"))
        .with(LeadField::PreferredCity, "Delhi")
        .with(LeadField::Mode, "Online");

    let err = engine.route_lead(&anonymous).await.unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));

    // Nothing rotated
    assert_eq!(repo.rule("delhi_online").await.unwrap().round_robin_index, 0);
}

#[tokio::test]
async fn test_unmatched_lead_falls_back_to_bootstrapped_default() {
    let (engine, repo) = TestEngine::new(SEED).build().await;
    let default_id = engine.config().default_counsellor.id.clone();

    // Created by the builder before any lead arrives
    assert!(repo.find_counsellor_by_id(&default_id).await.unwrap().is_some());

    let stray = lead().with(LeadField::PreferredCity, "Chennai");
    let result = engine.route_lead(&stray).await.unwrap();
    assert_eq!(result.target_id, default_id);
    assert_eq!(result.method, AssignmentMethod::Default);
    assert!(result.rule_id.is_none());
    assert!(result.reason.is_some());
}

#[tokio::test]
async fn test_rule_with_only_inactive_counsellors_falls_back() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let offline = lead().with(LeadField::Mode, "Offline");

    let result = engine.route_lead(&offline).await.unwrap();
    assert_eq!(result.method, AssignmentMethod::Default);
    assert_eq!(
        result.reason.as_deref(),
        Some("no eligible counsellor on any matching rule")
    );
}

#[tokio::test]
async fn test_l3_degree_narrows_to_single_rule() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let query = L3Query::new("alpha university", "Google").with_course(CourseField::Degree, "MBA");

    let result = engine.route_l3(&query).await.unwrap();
    assert_eq!(result.target_id, "l3b");
    assert_eq!(result.method, AssignmentMethod::Direct);
    assert_eq!(result.rule_id.as_deref(), Some("alpha_mba"));
    assert_eq!(result.matched_at_level.as_deref(), Some("degree"));
}

#[tokio::test]
async fn test_l3_without_course_uses_priority() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let query = L3Query::new("Alpha University", "Google");

    let result = engine.route_l3(&query).await.unwrap();
    assert_eq!(result.rule_id.as_deref(), Some("alpha_generic"));
    assert_eq!(result.matched_at_level.as_deref(), Some("priority-based"));
}

#[tokio::test]
async fn test_l3_pool_rotates() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let query = L3Query::new("Beta University", "Facebook");

    let first = engine.route_l3(&query).await.unwrap();
    let second = engine.route_l3(&query).await.unwrap();
    assert_eq!(first.method, AssignmentMethod::RoundRobin);
    assert_eq!(first.target_id, "l3a");
    assert_eq!(second.target_id, "l3b");
    assert_eq!(first.matched_at_level.as_deref(), Some("college-name-only"));
}

#[tokio::test]
async fn test_l3_without_gate_match_returns_dummy_agent() {
    let (engine, repo) = TestEngine::new(SEED).build().await;
    let query = L3Query::new("Gamma University", "Google");

    let result = engine.route_l3(&query).await.unwrap();
    assert_eq!(result.target_id, "dummy-l3-agent");
    assert_eq!(result.method, AssignmentMethod::DummyFallback);
    assert!(repo
        .find_counsellor_by_id("dummy-l3-agent")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_l3_requires_college_name() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let err = engine.route_l3(&L3Query::new("  ", "Google")).await.unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));
}

#[tokio::test]
async fn test_recon_cycles_universities_and_submits() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let mba = lead().with(LeadField::PreferredDegree, "MBA");

    let first = engine.route_university(&mba).await.unwrap();
    let second = engine.route_university(&mba).await.unwrap();
    assert_eq!(first.result.target_id, "Alpha University");
    assert_eq!(first.result.method, AssignmentMethod::RuleBased);
    assert_eq!(first.receipt.university, "Alpha University");
    assert_eq!(second.result.target_id, "Beta University");
}

#[tokio::test]
async fn test_recon_without_match_is_no_match() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let err = engine
        .route_university(&lead().with(LeadField::PreferredDegree, "BTech"))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::NoMatch(_)));
}

struct RejectingGateway;

#[async_trait::async_trait]
impl PartnerGateway for RejectingGateway {
    async fn submit(&self, university: &str, _lead: &Lead) -> Result<PartnerReceipt, PartnerError> {
        Err(PartnerError::Rejected(format!("{} is closed", university)))
    }
}

#[tokio::test]
async fn test_recon_partner_rejection_surfaces() {
    let (engine, _repo) = TestEngine::new(SEED)
        .with_partner(Arc::new(RejectingGateway))
        .build()
        .await;

    let err = engine
        .route_university(&lead().with(LeadField::PreferredDegree, "MBA"))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Partner(PartnerError::Rejected(_))));
}

#[tokio::test]
async fn test_assign_lead_persists_decision() {
    let harness = TestEngine::new(SEED);
    let notifier = harness.notifier();
    let (engine, repo) = harness.build().await;
    let delhi = Lead::new(identity())
        .with(LeadField::PreferredCity, "Delhi")
        .with(LeadField::Mode, "Online");

    let first = engine.assign_lead("lead-1", &delhi).await.unwrap();
    assert!(!first.is_reassignment());
    assert_eq!(first.result.target_id, "c1");

    let record = repo.find_lead("lead-1").await.unwrap().unwrap();
    assert_eq!(record.assigned_counsellor_id.as_deref(), Some("c1"));

    let logs = repo.assignment_logs("lead-1").await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].assigned_by, "system");
    assert_eq!(logs[0].rule_id.as_deref(), Some("delhi_online"));

    let second = engine.assign_lead("lead-1", &delhi).await.unwrap();
    assert_eq!(second.previous_counsellor_id.as_deref(), Some("c1"));
    assert_eq!(second.result.target_id, "c2");
    assert!(second.is_reassignment());

    let kinds: Vec<_> = notifier.sent().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![AssignmentKind::NewLead, AssignmentKind::Reassigned]);
}

#[tokio::test]
async fn test_assign_lead_requires_id() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    let err = engine.assign_lead(" ", &lead()).await.unwrap_err();
    assert!(matches!(err, SdkError::Validation(_)));
}

#[tokio::test]
async fn test_metrics_count_assignments() {
    let (engine, _repo) = TestEngine::new(SEED).build().await;
    engine
        .route_lead(&lead().with(LeadField::PreferredCity, "Chennai"))
        .await
        .unwrap();

    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.counter_value("assignments.l2.default"), 1);
}
