//! Observability module
//!
//! Counters and histograms for assignments, sweep outcomes, routing latency and errors.

pub mod metrics;

pub use metrics::{
    Counter, Histogram, HistogramSummary, Metrics, MetricsCollector, MetricsSnapshot,
    RoutingMetrics,
};
