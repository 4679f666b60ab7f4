//! Prometheus metrics for the proxy.
//!
//! All metrics follow the naming convention `vp_<area>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Final verdict per inbound request.
    pub static ref DISPATCH_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("vp_dispatch_outcomes_total", "Inbound messages by dispatch verdict"),
        &["verdict"]  // verified/unverified/suppressed/part_failed/invalid
    ).expect("metric creation failed");

    /// Message parts handed to the gateway.
    pub static ref PARTS_FORWARDED: Counter = Counter::new(
        "vp_gateway_parts_forwarded_total",
        "Message parts forwarded to the SMS gateway"
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION BACKEND
    // =========================================================================

    pub static ref HASH_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("vp_backend_hash_submissions_total", "storeHashes calls by result"),
        &["result"]  // stored/failed
    ).expect("metric creation failed");

    pub static ref BACKEND_RETRIES: Counter = Counter::new(
        "vp_backend_retries_total",
        "Verification backend requests retried after a transient failure"
    ).expect("metric creation failed");

    pub static ref BACKEND_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "vp_backend_request_duration_seconds",
            "Latency of verification backend requests, retries included"
        ).buckets(exponential_buckets(0.005, 2.0, 14).expect("bucket layout"))
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Calling it again is a
/// no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DISPATCH_OUTCOMES.clone()),
        Box::new(PARTS_FORWARDED.clone()),
        Box::new(HASH_SUBMISSIONS.clone()),
        Box::new(BACKEND_RETRIES.clone()),
        Box::new(BACKEND_REQUEST_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
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

/// Observes the elapsed time into a histogram on drop.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
