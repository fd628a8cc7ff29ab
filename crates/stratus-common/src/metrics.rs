//! Metrics for logging reconciliation
//!
//! OpenTelemetry instruments recorded by the reconciler. They are no-ops
//! until a meter provider is installed by [`crate::telemetry::init_telemetry`].

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

static METER: Lazy<Meter> = Lazy::new(|| global::meter("stratus"));

/// Counter of logging update reconciliations
///
/// Labels:
/// - `cluster`: cluster name
/// - `result`: success, unchanged, error
/// - `error_type`: error kind (errors only)
pub static LOGGING_UPDATES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("stratus_logging_updates_total")
        .with_description("Total number of logging update reconciliations")
        .with_unit("{updates}")
        .build()
});

/// Histogram of submit-to-terminal duration
///
/// Labels:
/// - `cluster`: cluster name
/// - `result`: success, error
pub static LOGGING_UPDATE_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("stratus_logging_update_duration_seconds")
        .with_description("Duration of logging updates from submission to terminal status")
        .with_unit("s")
        .build()
});

/// Counter of update status queries
///
/// Labels:
/// - `cluster`: cluster name
/// - `status`: InProgress, Successful, Failed, Cancelled, error
pub static UPDATE_STATUS_QUERIES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("stratus_update_status_queries_total")
        .with_description("Total number of update status queries")
        .with_unit("{queries}")
        .build()
});

/// Outcome label for a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// Update reached Successful
    Success,
    /// Desired state already matched; nothing submitted
    Unchanged,
    /// Any failure path
    Error,
}

impl UpdateResult {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Unchanged => "unchanged",
            Self::Error => "error",
        }
    }
}

/// Times one logging update from submission to terminal status
pub struct UpdateTimer {
    cluster: String,
    start: std::time::Instant,
}

impl UpdateTimer {
    /// Start timing an update
    pub fn start(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            start: std::time::Instant::now(),
        }
    }

    /// Record successful completion
    pub fn success(self) {
        self.finish(UpdateResult::Success, None);
    }

    /// Record a failure with its error kind
    pub fn error(self, error_type: &str) {
        self.finish(UpdateResult::Error, Some(error_type));
    }

    fn finish(self, result: UpdateResult, error_type: Option<&str>) {
        let duration = self.start.elapsed().as_secs_f64();
        LOGGING_UPDATE_DURATION.record(
            duration,
            &[
                KeyValue::new("cluster", self.cluster.clone()),
                KeyValue::new("result", result.as_str()),
            ],
        );
        record_update(&self.cluster, result, error_type);
    }
}

/// Count a reconciliation outcome
pub fn record_update(cluster: &str, result: UpdateResult, error_type: Option<&str>) {
    let mut labels = vec![
        KeyValue::new("cluster", cluster.to_string()),
        KeyValue::new("result", result.as_str()),
    ];
    if let Some(error_type) = error_type {
        labels.push(KeyValue::new("error_type", error_type.to_string()));
    }
    LOGGING_UPDATES.add(1, &labels);
}

/// Count one status query and what it returned
pub fn record_status_query(cluster: &str, status: &str) {
    UPDATE_STATUS_QUERIES.add(
        1,
        &[
            KeyValue::new("cluster", cluster.to_string()),
            KeyValue::new("status", status.to_string()),
        ],
    );
}
