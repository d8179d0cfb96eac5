//! Allocation and fallback behavior against the in-memory repository

use leadroute_core::{AssignmentMethod, Tier};
use leadroute_repository::{InMemoryRepository, RoutingRepository};
use leadroute_runtime::{
    AssignmentFallbackChain, DefaultCounsellor, RoundRobinAllocator, RuntimeError,
};
use std::sync::Arc;

const SEED: &str = r#"
counsellors:
  - { id: c1, name: Asha, email: asha@example.com, role: l2, status: active }
  - { id: c2, name: Ravi, email: ravi@example.com, role: l2, status: active }
  - { id: c3, name: Dev, email: dev@example.com, role: l2, status: active }
  - { id: off, name: Off, email: off@example.com, role: l2, status: inactive }
  - { id: l3a, name: Meera, email: meera@example.com, role: l3, status: active }
  - { id: l3b, name: Kabir, email: kabir@example.com, role: l3, status: inactive }
  - { id: l3s, name: Sam, email: sam@example.com, role: l3, status: suspended }
rules:
  - id: three_way
    tier: l2
    conditions: { mode: [Online] }
    assigned_counsellor_ids: [c1, c2, c3]
  - id: mixed
    tier: l2
    conditions: { mode: [Offline] }
    assigned_counsellor_ids: [off, c2, l3a]
    round_robin_index: 7
  - id: dormant
    tier: l2
    conditions: { mode: [Hybrid] }
    assigned_counsellor_ids: [off, l3a]
  - id: recon_mba
    tier: recon
    conditions: { preferred_degree: [MBA] }
    assigned_university_names: [Alpha University, Beta University]
l3_rules:
  - id: single
    university_name: [Alpha University]
    assigned_counsellor_ids: [l3a]
  - id: pair
    university_name: [Beta University]
    assigned_counsellor_ids: [l3b, l3s, l3a]
  - id: suspended_only
    university_name: [Gamma University]
    assigned_counsellor_ids: [l3s]
"#;

fn setup() -> (InMemoryRepository, RoundRobinAllocator) {
    let repo = InMemoryRepository::from_yaml(SEED).unwrap();
    let allocator = RoundRobinAllocator::new(Arc::new(repo.clone()));
    (repo, allocator)
}

#[tokio::test]
async fn test_cycles_all_targets_before_repeating() {
    let (repo, allocator) = setup();
    let rule = repo.rule("three_way").await.unwrap();

    let mut picks = Vec::new();
    for _ in 0..3 {
        let allocation = allocator.allocate(&rule).await.unwrap();
        assert_eq!(allocation.method, AssignmentMethod::RoundRobin);
        picks.push(allocation.target_id);
    }
    assert_eq!(picks, vec!["c1", "c2", "c3"]);

    let fourth = allocator.allocate(&rule).await.unwrap();
    assert_eq!(fourth.target_id, "c1");
}

#[tokio::test]
async fn test_ineligible_targets_are_filtered_and_stale_index_resets() {
    let (repo, allocator) = setup();
    let rule = repo.rule("mixed").await.unwrap();

    // Only c2 is an active L2 counsellor; index 7 is out of range and resets
    let allocation = allocator.allocate(&rule).await.unwrap();
    assert_eq!(allocation.target_id, "c2");
    assert_eq!(allocation.slot, Some(0));
    assert_eq!(repo.rule("mixed").await.unwrap().round_robin_index, 0);
}

#[tokio::test]
async fn test_all_targets_ineligible_is_exhausted() {
    let (repo, allocator) = setup();
    let rule = repo.rule("dormant").await.unwrap();

    let err = allocator.allocate(&rule).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::AllocationExhausted { ref rule_id } if rule_id == "dormant"
    ));
}

#[tokio::test]
async fn test_l3_single_counsellor_is_direct() {
    let (repo, allocator) = setup();
    let rule = repo.l3_rule("single").await.unwrap();

    let allocation = allocator.allocate_l3(&rule).await.unwrap();
    assert_eq!(allocation.target_id, "l3a");
    assert_eq!(allocation.method, AssignmentMethod::Direct);
    assert_eq!(allocation.slot, None);
    assert_eq!(repo.l3_rule("single").await.unwrap().round_robin_index, 0);
}

#[tokio::test]
async fn test_l3_rotation_skips_suspended_only() {
    let (repo, allocator) = setup();
    let rule = repo.l3_rule("pair").await.unwrap();

    // l3b is inactive but still eligible for L3; l3s is suspended
    let first = allocator.allocate_l3(&rule).await.unwrap();
    let second = allocator.allocate_l3(&rule).await.unwrap();
    assert_eq!(first.target_id, "l3b");
    assert_eq!(second.target_id, "l3a");
    assert_eq!(second.method, AssignmentMethod::RoundRobin);

    let suspended = repo.l3_rule("suspended_only").await.unwrap();
    assert!(matches!(
        allocator.allocate_l3(&suspended).await,
        Err(RuntimeError::AllocationExhausted { .. })
    ));
}

#[tokio::test]
async fn test_university_cycling() {
    let (repo, allocator) = setup();
    let rule = repo.rule("recon_mba").await.unwrap();

    let first = allocator.allocate_university(&rule).await.unwrap();
    let second = allocator.allocate_university(&rule).await.unwrap();
    assert_eq!(first.target_id, "Alpha University");
    assert_eq!(second.target_id, "Beta University");
    assert_eq!(first.method, AssignmentMethod::RuleBased);
}

#[tokio::test]
async fn test_fallback_prefers_existing_default_by_id() {
    let repo = InMemoryRepository::from_yaml(SEED).unwrap();
    let chain = AssignmentFallbackChain::new(
        Arc::new(repo.clone()),
        DefaultCounsellor::new("c1", "someone@example.com", "Default"),
        "dummy-l3",
    );

    let result = chain.assign_default("no rule matched").await.unwrap();
    assert_eq!(result.target_id, "c1");
    assert_eq!(result.method, AssignmentMethod::Default);
    assert_eq!(result.reason.as_deref(), Some("no rule matched"));
}

#[tokio::test]
async fn test_fallback_by_email_then_create() {
    let repo = InMemoryRepository::from_yaml(SEED).unwrap();
    let by_email = AssignmentFallbackChain::new(
        Arc::new(repo.clone()),
        DefaultCounsellor::new("unknown-id", "RAVI@example.com", "Default"),
        "dummy-l3",
    );
    assert_eq!(by_email.resolve_default().await.unwrap().id, "c2");

    let before = repo.counsellor_count().await;
    let create = AssignmentFallbackChain::new(
        Arc::new(repo.clone()),
        DefaultCounsellor::default(),
        "dummy-l3",
    );
    let created = create.resolve_default().await.unwrap();
    assert_eq!(created.id, DefaultCounsellor::default().id);
    assert_eq!(repo.counsellor_count().await, before + 1);

    // Second resolution finds the record instead of creating another
    create.resolve_default().await.unwrap();
    assert_eq!(repo.counsellor_count().await, before + 1);
    assert!(repo
        .find_counsellor_by_id(&created.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_dummy_l3_is_never_created() {
    let repo = InMemoryRepository::new();
    let chain = AssignmentFallbackChain::new(
        Arc::new(repo.clone()),
        DefaultCounsellor::default(),
        "dummy-l3-agent",
    );

    let result = chain.assign_dummy_l3("no ruleset found matching collegeName and source criteria");
    assert_eq!(result.target_id, "dummy-l3-agent");
    assert_eq!(result.method, AssignmentMethod::DummyFallback);
    assert_eq!(repo.counsellor_count().await, 0);
    assert!(repo.find_active_rules(Tier::L2).await.unwrap().is_empty());
}
