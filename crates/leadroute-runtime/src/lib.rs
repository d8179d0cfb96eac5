//! Runtime building blocks for the lead routing engine
//!
//! - [`RoundRobinAllocator`]: fair rotation over a matched rule's targets
//! - [`AssignmentFallbackChain`]: default counsellor and L3 sentinel fallbacks
//! - [`Notifier`]: best-effort assignment notifications
//! - [`observability`]: routing metrics

pub mod allocator;
pub mod error;
pub mod fallback;
pub mod notifier;
pub mod observability;

pub use allocator::{Allocation, RoundRobinAllocator};
pub use error::{Result, RuntimeError};
pub use fallback::{AssignmentFallbackChain, DefaultCounsellor};
pub use notifier::{
    AssignmentKind, AssignmentNotification, LoggingNotifier, Notifier, QueuedNotifier,
};
pub use observability::{MetricsSnapshot, RoutingMetrics};
