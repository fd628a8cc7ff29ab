//! Cluster configuration and runtime settings
//!
//! [`ClusterConfig`] is the user-facing YAML document declaring which
//! control-plane logging facilities a cluster should have. [`PollConfig`]
//! controls how long and how often update status is queried.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::facilities::{expand, facility_names, LogFacility};
use crate::{Error, Result};

/// Env var overriding the status poll interval (seconds)
pub const POLL_INTERVAL_ENV: &str = "STRATUS_UPDATE_POLL_INTERVAL_SECS";

/// Env var bounding total wait for an update (seconds)
pub const UPDATE_TIMEOUT_ENV: &str = "STRATUS_UPDATE_TIMEOUT_SECS";

/// Default interval between update status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Cluster configuration document
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Cluster identity
    pub metadata: ClusterMeta,

    /// CloudWatch settings (logging is off when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_watch: Option<CloudWatchSpec>,
}

/// Cluster identity
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMeta {
    /// Cluster name as known to the provider
    pub name: String,

    /// Provider region (e.g., "us-west-2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// CloudWatch integration settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudWatchSpec {
    /// Control-plane log delivery
    #[serde(default)]
    pub cluster_logging: ClusterLoggingSpec,
}

/// Control-plane logging declaration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLoggingSpec {
    /// Facilities to enable: names, `*`/`all`, or empty for none
    #[serde(default)]
    pub enable_types: Vec<String>,
}

impl ClusterConfig {
    /// Create a config for the named cluster with logging disabled
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ClusterMeta {
                name: name.into(),
                region: None,
            },
            cloud_watch: None,
        }
    }

    /// Parse a config document from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::serialization_for_kind("ClusterConfig", e.to_string()))
    }

    /// Render the config document as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::serialization_for_kind("ClusterConfig", e.to_string()))
    }

    /// Validate the config
    pub fn validate(&self) -> Result<()> {
        if self.metadata.name.trim().is_empty() {
            return Err(Error::validation_for_field(
                crate::error::UNKNOWN_CONTEXT,
                "metadata.name",
                "cluster name cannot be empty",
            ));
        }
        self.enabled_facilities()?;
        Ok(())
    }

    /// Raw requested facility tokens (empty when logging is not configured)
    pub fn requested_facilities(&self) -> &[String] {
        self.cloud_watch
            .as_ref()
            .map(|cw| cw.cluster_logging.enable_types.as_slice())
            .unwrap_or(&[])
    }

    /// Facilities the config asks to enable
    pub fn enabled_facilities(&self) -> Result<Vec<LogFacility>> {
        expand(self.requested_facilities())
    }

    /// Normalize the logging declaration in place.
    ///
    /// Wildcards are expanded to every facility name; explicit names are
    /// kept as given. Running this twice yields the same config.
    pub fn set_defaults(&mut self) -> Result<()> {
        let enabled = self.enabled_facilities()?;
        if let Some(cw) = self.cloud_watch.as_mut() {
            cw.cluster_logging.enable_types = facility_names(&enabled);
        }
        Ok(())
    }
}

/// Update status polling settings
///
/// The interval is never zero; every constructor rejects it.
#[derive(Clone, Debug, PartialEq)]
pub struct PollConfig {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl PollConfig {
    /// Create a config polling at the given interval with no timeout
    pub fn with_interval(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::validation_for_field(
                crate::error::UNKNOWN_CONTEXT,
                "interval",
                "poll interval must be greater than zero",
            ));
        }
        Ok(Self {
            interval,
            ..Default::default()
        })
    }

    /// Bound the total wait
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait between status queries
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total wait bound; `None` waits until a terminal status or cancellation
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Defaults overridden by `STRATUS_UPDATE_POLL_INTERVAL_SECS` and
    /// `STRATUS_UPDATE_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match parse_secs(POLL_INTERVAL_ENV, lookup(POLL_INTERVAL_ENV))? {
            Some(secs) => Self::with_interval(Duration::from_secs(secs)).map_err(|_| {
                Error::validation_for_field(
                    crate::error::UNKNOWN_CONTEXT,
                    POLL_INTERVAL_ENV,
                    "poll interval must be at least 1 second",
                )
            })?,
            None => Self::default(),
        };
        if let Some(secs) = parse_secs(UPDATE_TIMEOUT_ENV, lookup(UPDATE_TIMEOUT_ENV))? {
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn parse_secs(key: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.trim().parse::<u64>().map_err(|e| {
                Error::validation_for_field(
                    crate::error::UNKNOWN_CONTEXT,
                    key,
                    format!("expected whole seconds, got {v:?}: {e}"),
                )
            })
        })
        .transpose()
}
