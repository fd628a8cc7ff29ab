//! Telemetry initialization for tracing and metrics
//!
//! Host processes embedding the reconciler call [`init_telemetry`] once at
//! startup. Log lines go to stdout as text or JSON; when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set, reconcile spans and the counters in
//! [`crate::metrics`] are also exported over OTLP.
//!
//! ```ignore
//! use stratus_common::telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(TelemetryConfig::from_env()?)?;
//! let reconciler = LoggingReconciler::new(client, PollConfig::from_env()?);
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,stratus_common=debug,stratus_logging=debug";

/// Env var naming the OTLP collector
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Env var selecting log output: `json` or `text`
pub const LOG_FORMAT_ENV: &str = "STRATUS_LOG_FORMAT";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Unrecognized `STRATUS_LOG_FORMAT` value
    #[error("unsupported log format {0:?}, expected \"json\" or \"text\"")]
    LogFormat(String),

    /// OTLP span or metric exporter could not be built
    #[error("failed to initialize OTLP exporter: {0}")]
    Exporter(String),

    /// A global subscriber is already installed
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and metrics
    pub service_name: String,

    /// OTLP endpoint (e.g., "http://otel-collector:4317"); local logging only when None
    pub otlp_endpoint: Option<String>,

    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "stratus".to_string(),
            otlp_endpoint: std::env::var(OTLP_ENDPOINT_ENV).ok(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overridden by `OTEL_EXPORTER_OTLP_ENDPOINT` and `STRATUS_LOG_FORMAT`
    pub fn from_env() -> Result<Self, TelemetryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TelemetryError> {
        let json = match lookup(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("") | Some("text") => false,
            Some("json") => true,
            Some(other) => return Err(TelemetryError::LogFormat(other.to_string())),
        };
        Ok(Self {
            service_name: "stratus".to_string(),
            otlp_endpoint: lookup(OTLP_ENDPOINT_ENV).filter(|e| !e.is_empty()),
            json,
        })
    }
}

/// Install the global subscriber, plus OTLP export when an endpoint is set
///
/// Succeeds at most once per process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let tracer = install_otlp(endpoint, &config.service_name)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

fn service_resource(service_name: &str) -> Resource {
    Resource::new([
        KeyValue::new(SERVICE_NAME, service_name.to_string()),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ])
}

/// Register global tracer and meter providers exporting to `endpoint`
fn install_otlp(endpoint: &str, service_name: &str) -> Result<Tracer, TelemetryError> {
    let resource = service_resource(service_name);

    let metrics = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;
    global::set_meter_provider(
        SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metrics, runtime::Tokio).build())
            .with_resource(resource.clone())
            .build(),
    );

    let spans = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;
    let provider = TracerProvider::builder()
        .with_batch_exporter(spans, runtime::Tokio)
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());

    Ok(provider.tracer(service_name.to_string()))
}
