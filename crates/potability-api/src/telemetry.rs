//! Logging and Prometheus metrics
//!
//! Metrics exposed under the `potability` namespace:
//! - `potability_predictions_total` (counter) - predictions served, by label
//! - `potability_validation_failures_total` (counter) - rejected payloads
//! - `potability_inference_failures_total` (counter) - failed inferences, by reason
//! - `potability_inference_duration_seconds` (histogram) - model call latency

use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use thiserror::Error;

use crate::config::LogFormat;
use potability_core::PotabilityLabel;

/// Metrics errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metrics error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Install the global tracing subscriber
///
/// Level comes from `RUST_LOG`, defaulting to `info`. Logs go to stderr so
/// CLI output on stdout stays clean. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    // Already initialized (tests, repeated calls).
    result.ok();
}

/// Prediction metrics with their own registry
#[derive(Clone)]
pub struct PredictionMetrics {
    registry: Arc<Registry>,
    predictions_total: CounterVec,
    validation_failures_total: Counter,
    inference_failures_total: CounterVec,
    inference_duration_seconds: Histogram,
}

impl PredictionMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let predictions_total = CounterVec::new(
            Opts::new("predictions_total", "Total number of predictions served")
                .namespace("potability"),
            &["label"],
        )?;

        let validation_failures_total = Counter::with_opts(
            Opts::new(
                "validation_failures_total",
                "Total number of prediction requests rejected by validation",
            )
            .namespace("potability"),
        )?;

        let inference_failures_total = CounterVec::new(
            Opts::new(
                "inference_failures_total",
                "Total number of failed model inferences",
            )
            .namespace("potability"),
            &["reason"],
        )?;

        let inference_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "inference_duration_seconds",
                "Model inference duration in seconds",
            )
            .namespace("potability")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(validation_failures_total.clone()))?;
        registry.register(Box::new(inference_failures_total.clone()))?;
        registry.register(Box::new(inference_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            predictions_total,
            validation_failures_total,
            inference_failures_total,
            inference_duration_seconds,
        })
    }

    pub fn record_prediction(&self, label: PotabilityLabel) {
        self.predictions_total
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures_total.inc();
    }

    pub fn record_inference_failure(&self, reason: &str) {
        self.inference_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn observe_inference(&self, duration_secs: f64) {
        self.inference_duration_seconds.observe(duration_secs);
    }

    pub fn predictions(&self, label: PotabilityLabel) -> u64 {
        self.predictions_total
            .with_label_values(&[label.as_str()])
            .get() as u64
    }

    pub fn validation_failures(&self) -> u64 {
        self.validation_failures_total.get() as u64
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}
