//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use leadroute_core::{Lead, LeadIdentity};
use leadroute_repository::{InMemoryRepository, LeadActivity, LeadRecord, RoutingRepository};
use leadroute_runtime::{AssignmentNotification, Notifier};
use leadroute_sdk::{
    EngineConfig, LoggingPartnerGateway, PartnerGateway, RoutingEngine, RoutingEngineBuilder,
};
use std::sync::{Arc, Mutex};

/// Test helper to build a RoutingEngine over an inline YAML seed
pub struct TestEngine {
    seed: String,
    config: EngineConfig,
    partner: Arc<dyn PartnerGateway>,
    notifier: Arc<RecordingNotifier>,
}

impl TestEngine {
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.trim().to_string(),
            config: EngineConfig::new(),
            partner: Arc::new(LoggingPartnerGateway),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_partner(mut self, partner: Arc<dyn PartnerGateway>) -> Self {
        self.partner = partner;
        self
    }

    pub fn notifier(&self) -> Arc<RecordingNotifier> {
        self.notifier.clone()
    }

    /// Build the engine; the returned repository shares state with it
    pub async fn build(self) -> (Arc<RoutingEngine>, InMemoryRepository) {
        let repo = InMemoryRepository::from_yaml(&self.seed).expect("seed should load");
        let engine = RoutingEngineBuilder::new()
            .with_config(self.config)
            .with_repository(Arc::new(repo.clone()))
            .with_notifier(self.notifier)
            .with_partner_gateway(self.partner)
            .build()
            .await
            .expect("engine should build");
        (Arc::new(engine), repo)
    }
}

/// Notifier that keeps every notification it receives
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AssignmentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<AssignmentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_assignment(
        &self,
        notification: &AssignmentNotification,
    ) -> leadroute_runtime::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn identity() -> LeadIdentity {
    LeadIdentity::new("Priya", "priya@example.com", "9876543210")
}

pub fn lead() -> Lead {
    Lead::new(identity())
}

/// Fixed sweep clock at midday
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

/// Store a lead assigned an hour before `now` with one activity snapshot
pub async fn seed_stale_lead(
    repo: &InMemoryRepository,
    lead_id: &str,
    counsellor_id: &str,
    snapshot: Option<Lead>,
    now: DateTime<Utc>,
) {
    let created = now - Duration::hours(1);
    repo.save_lead(&LeadRecord::new(lead_id, created).assigned_to(counsellor_id, created))
        .await
        .unwrap();
    if let Some(snapshot) = snapshot {
        repo.record_lead_activity(&LeadActivity {
            lead_id: lead_id.to_string(),
            recorded_at: created,
            snapshot,
        })
        .await
        .unwrap();
    }
}
