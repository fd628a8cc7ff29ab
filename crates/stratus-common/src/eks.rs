//! Provider data model for cluster logging updates
//!
//! These are the shapes exchanged with the managed-cluster provider's
//! `UpdateClusterConfig`, `DescribeUpdate` and `DescribeCluster` calls. The
//! transport itself lives behind the client trait in `stratus-logging`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::facilities::LogFacility;

/// Provider error codes that indicate a transient condition
const RETRYABLE_SERVICE_CODES: [&str; 3] = [
    "ThrottlingException",
    "ServerException",
    "ServiceUnavailableException",
];

/// One logging group in an update request or a describe response
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogSetup {
    /// Whether the listed facilities are turned on or off
    pub enabled: bool,
    /// Facilities affected; empty means no change in this direction
    #[serde(default)]
    pub types: Vec<LogFacility>,
}

impl LogSetup {
    /// Logging group turning the given facilities on
    pub fn enable(types: Vec<LogFacility>) -> Self {
        Self {
            enabled: true,
            types,
        }
    }

    /// Logging group turning the given facilities off
    pub fn disable(types: Vec<LogFacility>) -> Self {
        Self {
            enabled: false,
            types,
        }
    }
}

/// Status of an asynchronous provider update
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Update is still being applied
    InProgress,
    /// Update completed
    Successful,
    /// Update failed; see the update's error details
    Failed,
    /// Update was cancelled by the provider
    Cancelled,
}

impl UpdateStatus {
    /// Whether no further transition can happen from this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "InProgress",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Kind of provider update
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum UpdateType {
    /// Control-plane logging configuration change
    LoggingUpdate,
    /// Kubernetes version upgrade
    VersionUpdate,
    /// API endpoint access change
    EndpointAccessUpdate,
    /// Generic configuration change
    ConfigUpdate,
    /// A kind this crate does not know about
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggingUpdate => f.write_str("LoggingUpdate"),
            Self::VersionUpdate => f.write_str("VersionUpdate"),
            Self::EndpointAccessUpdate => f.write_str("EndpointAccessUpdate"),
            Self::ConfigUpdate => f.write_str("ConfigUpdate"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// Error detail attached to a failed update
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Provider error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error_code, &self.error_message) {
            (Some(code), Some(msg)) => write!(f, "{code}: {msg}"),
            (Some(code), None) => f.write_str(code),
            (None, Some(msg)) => f.write_str(msg),
            (None, None) => f.write_str("no details"),
        }
    }
}

/// A provider update record
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    /// Update id used to query status
    pub id: String,
    /// Kind of update
    #[serde(rename = "type")]
    pub update_type: UpdateType,
    /// Current status
    pub status: UpdateStatus,
    /// Error details, populated when the update failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

impl Update {
    /// Handle used to poll this update
    pub fn handle(&self) -> UpdateHandle {
        UpdateHandle {
            id: self.id.clone(),
            update_type: self.update_type.clone(),
        }
    }
}

/// Reference to an in-flight provider update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateHandle {
    /// Update id
    pub id: String,
    /// Kind of update
    pub update_type: UpdateType,
}

/// Error returned by the provider client
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The provider answered with an error
    #[error("{code}: {message}")]
    Service {
        /// Provider error code (e.g. "InvalidParameterException")
        code: String,
        /// Provider error message
        message: String,
    },

    /// The request never got a provider answer
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Create a service error
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether repeating the call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service { code, .. } => RETRYABLE_SERVICE_CODES.contains(&code.as_str()),
            Self::Transport(_) => true,
        }
    }
}
