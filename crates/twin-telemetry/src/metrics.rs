//! Prometheus metrics for the twin service.
//!
//! All metrics follow the naming convention: `twins_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{exponential_buckets, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Outcome notifications observed, by operation and result
    pub static ref OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("twins_outcomes_total", "Outcome notifications of mutating operations"),
        &["operation", "result"]  // operation: create/update/remove/state, result: success/failure
    ).expect("metric creation failed");

    /// Telemetry batches handled by the state consumer
    pub static ref TELEMETRY_MESSAGES: CounterVec = CounterVec::new(
        Opts::new("twins_telemetry_messages_total", "Telemetry batches handled"),
        &["result"]  // result: handled/rejected/failed
    ).expect("metric creation failed");

    /// Notifications whose publish failed and were discarded
    pub static ref NOTIFICATIONS_DROPPED: CounterVec = CounterVec::new(
        Opts::new("twins_notifications_dropped_total", "Notifications lost to publish failures"),
        &["topic"]
    ).expect("metric creation failed");

    /// Time spent handling one telemetry batch end to end
    pub static ref STATE_SAVE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "twins_state_save_duration_seconds",
            "Time spent deciding and persisting state for one telemetry batch"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OUTCOMES.clone()),
        Box::new(TELEMETRY_MESSAGES.clone()),
        Box::new(NOTIFICATIONS_DROPPED.clone()),
        Box::new(STATE_SAVE_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
