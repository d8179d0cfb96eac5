//! Lead routing SDK
//!
//! High-level API for routing inbound leads to counsellors, handing leads to
//! L3 counsellors, routing leads to partner universities, and periodically
//! reassigning leads nobody opened.
//!
//! ```rust,ignore
//! use leadroute_sdk::{RepositoryConfig, RoutingEngineBuilder};
//!
//! let engine = RoutingEngineBuilder::new()
//!     .with_repository_config(RepositoryConfig::memory_with_seed("config/routing.yaml"))
//!     .build()
//!     .await?;
//!
//! let result = engine.route_raw(&payload).await?;
//! println!("{} via {}", result.target_id, result.method);
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod partner;
pub mod sweep;

// Re-export main types
pub use builder::RoutingEngineBuilder;
pub use config::{EngineConfig, SweepConfig};
pub use engine::{LeadAssignment, RoutingEngine, UniversityRouting};
pub use error::{Result, SdkError};
pub use partner::{LoggingPartnerGateway, PartnerError, PartnerGateway, PartnerReceipt};
pub use sweep::{LeadSweepResult, ReassignmentSweep, SweepOutcome, SweepReport};

// Re-export commonly used types from dependencies
pub use leadroute_core::{AssignmentMethod, AssignmentResult, L3Query, Lead};
pub use leadroute_repository::RepositoryConfig;
pub use leadroute_runtime::{DefaultCounsellor, MetricsSnapshot, Notifier, RoutingMetrics};
