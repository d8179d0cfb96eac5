//! Storage collaborator for the lead routing engine
//!
//! This crate owns every piece of persisted routing state: assignment rules
//! and their rotation indexes, L3 rules, counsellors, lead assignment records,
//! lead activity snapshots and the assignment audit log.
//!
//! # Features
//!
//! - **In-memory repository**: process-local store seeded from YAML, used by
//!   tests, demos and single-node deployments
//! - **PostgreSQL repository** (`postgres` feature): sqlx-backed store with
//!   row-level atomic rotation and retry counters
//! - **Async API**: non-blocking operations with Tokio
//!
//! # Quick Start
//!
//! ```no_run
//! use leadroute_core::Tier;
//! use leadroute_repository::{InMemoryRepository, RoutingRepository};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repo = InMemoryRepository::from_yaml(r#"
//! counsellors:
//!   - { id: c1, name: Asha, email: asha@example.com, role: l2, status: active }
//! rules:
//!   - id: delhi_online
//!     tier: l2
//!     conditions: { preferred_city: [Delhi], mode: [Online] }
//!     assigned_counsellor_ids: [c1]
//! "#)?;
//!
//!     let rules = repo.find_active_rules(Tier::L2).await?;
//!     println!("{} active L2 rules", rules.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod loader;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::{ConfigError, RepositoryConfig, RepositorySource};
pub use content::RepositoryContent;
pub use error::{RepositoryError, RepositoryResult};
pub use loader::RepositoryLoader;
pub use memory::InMemoryRepository;
pub use models::{AssignmentLogEntry, LeadActivity, LeadRecord, LeadSnapshot, StaleLeadQuery};
pub use traits::{AdminRepository, RoutingRepository};

#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;
