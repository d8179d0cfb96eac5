//! In-process routing metrics

use leadroute_core::{AssignmentMethod, Tier};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counter metric
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Samples retained per histogram for percentile estimates
pub const HISTOGRAM_WINDOW: usize = 1024;

#[derive(Debug, Default)]
struct HistogramState {
    window: VecDeque<f64>,
    count: usize,
    sum: f64,
}

/// Histogram metric for tracking distributions
///
/// Count and sum cover every observation; percentiles are taken over the
/// most recent [`HISTOGRAM_WINDOW`] samples.
#[derive(Debug, Default)]
pub struct Histogram {
    state: Mutex<HistogramState>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, value: f64) {
        let mut state = lock(&self.state);
        if state.window.len() == HISTOGRAM_WINDOW {
            state.window.pop_front();
        }
        state.window.push_back(value);
        state.count += 1;
        state.sum += value;
    }

    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    pub fn count(&self) -> usize {
        lock(&self.state).count
    }

    /// Number of samples currently held for percentiles
    pub fn retained(&self) -> usize {
        lock(&self.state).window.len()
    }

    pub fn sum(&self) -> f64 {
        lock(&self.state).sum
    }

    pub fn avg(&self) -> f64 {
        let state = lock(&self.state);
        if state.count == 0 {
            0.0
        } else {
            state.sum / state.count as f64
        }
    }

    /// Get percentile (0-100)
    pub fn percentile(&self, p: f64) -> f64 {
        percentile_of(&self.sorted_window(), p)
    }

    /// Count, mean, p50 and p99 from a single sorted copy of the window
    pub fn summary(&self) -> HistogramSummary {
        let (count, sum, sorted) = {
            let state = lock(&self.state);
            let mut sorted: Vec<f64> = state.window.iter().copied().collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            (state.count, state.sum, sorted)
        };
        HistogramSummary {
            count,
            avg: if count == 0 { 0.0 } else { sum / count as f64 },
            p50: percentile_of(&sorted, 50.0),
            p99: percentile_of(&sorted, 99.0),
        }
    }

    pub fn reset(&self) {
        *lock(&self.state) = HistogramState::default();
    }

    fn sorted_window(&self) -> Vec<f64> {
        let mut values: Vec<f64> = lock(&self.state).window.iter().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }
}

fn percentile_of(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Metrics trait
pub trait Metrics: Send + Sync {
    fn counter(&self, name: &str) -> Arc<Counter>;

    fn histogram(&self, name: &str) -> Arc<Histogram>;

    fn record_execution_time(&self, operation: &str, duration: Duration) {
        self.histogram(&format!("{}.duration_seconds", operation))
            .observe_duration(duration);
    }

    fn record_error(&self, error_type: &str) {
        self.counter(&format!("errors.{}", error_type)).inc();
    }
}

/// Named counters and histograms created on first use
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter values, sorted by name
    pub fn counter_values(&self) -> BTreeMap<String, u64> {
        let counters = self
            .counters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counters
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get()))
            .collect()
    }

    /// Summaries of every histogram, sorted by name
    pub fn histogram_summaries(&self) -> BTreeMap<String, HistogramSummary> {
        let histograms = self
            .histograms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        histograms
            .iter()
            .map(|(name, h)| (name.clone(), h.summary()))
            .collect()
    }

    pub fn reset_all(&self) {
        for counter in self
            .counters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
        {
            counter.reset();
        }
        for histogram in self
            .histograms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
        {
            histogram.reset();
        }
    }
}

impl Metrics for MetricsCollector {
    fn counter(&self, name: &str) -> Arc<Counter> {
        self.counters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn histogram(&self, name: &str) -> Arc<Histogram> {
        self.histograms
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub avg: f64,
    pub p50: f64,
    pub p99: f64,
}

/// Serializable view of all routing metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Routing-specific metric names over a [`MetricsCollector`]
#[derive(Debug, Default)]
pub struct RoutingMetrics {
    collector: MetricsCollector,
}

impl RoutingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an assignment by tier and method (e.g. `assignments.l2.round-robin`)
    pub fn record_assignment(&self, tier: Tier, method: AssignmentMethod) {
        self.collector
            .counter(&format!("assignments.{}.{}", tier, method))
            .inc();
    }

    /// Count a sweep outcome (e.g. `sweep.reassigned`)
    pub fn record_sweep_outcome(&self, outcome: &str) {
        self.collector.counter(&format!("sweep.{}", outcome)).inc();
    }

    pub fn record_routing_time(&self, tier: Tier, duration: Duration) {
        self.collector
            .record_execution_time(&format!("routing.{}", tier), duration);
    }

    pub fn record_error(&self, error_type: &str) {
        self.collector.record_error(error_type);
    }

    pub fn counter_value(&self, name: &str) -> u64 {
        self.collector
            .counter_values()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.collector.counter_values(),
            histograms: self.collector.histogram_summaries(),
        }
    }

    pub fn reset(&self) {
        self.collector.reset_all();
    }
}
