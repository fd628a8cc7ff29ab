//! Error types for Stratus
//!
//! Errors are structured with fields to aid debugging in production.
//! Each variant carries the context needed to act on it: the offending
//! facility tokens, the cluster name, or the provider update id.

use thiserror::Error;

use crate::eks::{ApiError, ErrorDetail, UpdateType};

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Stratus operations
#[derive(Debug, Error)]
pub enum Error {
    /// Requested logging facility is not supported by the provider
    #[error("unknown logging facility {tokens:?}: {message}")]
    UnknownFacility {
        /// Offending tokens, in request order
        tokens: Vec<String>,
        /// Why the tokens were rejected
        message: String,
    },

    /// Validation error for a cluster config document
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "cloudWatch.clusterLogging")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The document kind being parsed (if known)
        kind: Option<String>,
    },

    /// Provider rejected or could not process the logging update
    #[error("logging update submission for {cluster} failed: {source}")]
    SubmissionFailed {
        /// Cluster the update was submitted for
        cluster: String,
        /// Error returned by the provider client
        #[source]
        source: ApiError,
    },

    /// Querying the status of an in-flight update failed
    #[error("status query for update {update_id} on {cluster} failed: {source}")]
    PollFailed {
        /// Cluster owning the update
        cluster: String,
        /// Provider update id being polled
        update_id: String,
        /// Error returned by the provider client
        #[source]
        source: ApiError,
    },

    /// Reading the current logging configuration failed
    #[error("describing logging configuration for {cluster} failed: {source}")]
    DescribeFailed {
        /// Cluster being described
        cluster: String,
        /// Error returned by the provider client
        #[source]
        source: ApiError,
    },

    /// Provider reported the update as Failed
    #[error("update {update_id} ({update_type}) failed{}", render_details(.errors))]
    OperationFailed {
        /// Provider update id
        update_id: String,
        /// Kind of update
        update_type: UpdateType,
        /// Error details reported by the provider
        errors: Vec<ErrorDetail>,
    },

    /// Provider reported the update as Cancelled
    #[error("update {update_id} ({update_type}) was cancelled by the provider")]
    OperationCancelled {
        /// Provider update id
        update_id: String,
        /// Kind of update
        update_type: UpdateType,
    },

    /// Caller cancelled (or timed out) while waiting on an update
    #[error("stopped waiting for update {update_id}: {reason}")]
    CancelledByCaller {
        /// Provider update id that was being polled
        update_id: String,
        /// Why polling stopped (cancellation or deadline)
        reason: String,
    },
}

fn render_details(errors: &[ErrorDetail]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!(": {}", rendered.join("; "))
}

impl Error {
    /// Create an unknown-facility error for the given tokens
    pub fn unknown_facilities(tokens: Vec<String>) -> Self {
        let message = format!(
            "supported facilities are {:?}",
            crate::facilities::supported_facility_names()
        );
        Self::UnknownFacility { tokens, message }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error for a document kind
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Check if retrying the whole reconciliation could succeed
    ///
    /// Local validation and provider-reported terminal outcomes are not
    /// retryable. Client failures are retryable when the client says so.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::UnknownFacility { .. } => false,
            Error::Validation { .. } => false,
            Error::Serialization { .. } => false,
            Error::SubmissionFailed { source, .. } => source.is_retryable(),
            Error::PollFailed { source, .. } => source.is_retryable(),
            Error::DescribeFailed { source, .. } => source.is_retryable(),
            Error::OperationFailed { .. } => false,
            Error::OperationCancelled { .. } => true,
            Error::CancelledByCaller { .. } => true,
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::Validation { cluster, .. } => Some(cluster),
            Error::SubmissionFailed { cluster, .. } => Some(cluster),
            Error::PollFailed { cluster, .. } => Some(cluster),
            Error::DescribeFailed { cluster, .. } => Some(cluster),
            _ => None,
        }
    }

    /// Get the provider update id if this error concerns an in-flight update
    pub fn update_id(&self) -> Option<&str> {
        match self {
            Error::PollFailed { update_id, .. } => Some(update_id),
            Error::OperationFailed { update_id, .. } => Some(update_id),
            Error::OperationCancelled { update_id, .. } => Some(update_id),
            Error::CancelledByCaller { update_id, .. } => Some(update_id),
            _ => None,
        }
    }

    /// Short label for metrics (`error_type`)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownFacility { .. } => "unknown_facility",
            Error::Validation { .. } => "validation",
            Error::Serialization { .. } => "serialization",
            Error::SubmissionFailed { .. } => "submission_failed",
            Error::PollFailed { .. } => "poll_failed",
            Error::DescribeFailed { .. } => "describe_failed",
            Error::OperationFailed { .. } => "operation_failed",
            Error::OperationCancelled { .. } => "operation_cancelled",
            Error::CancelledByCaller { .. } => "cancelled_by_caller",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Story Tests: Error Propagation in Logging Reconciliation
    // ==========================================================================

    /// Story: bad facility names are caught locally with every offender listed
    #[test]
    fn story_unknown_facilities_name_offending_tokens() {
        let err = Error::unknown_facilities(vec!["anything".into(), "anyOtherThing".into()]);
        let msg = err.to_string();
        assert!(msg.contains("anything"));
        assert!(msg.contains("anyOtherThing"));
        assert!(msg.contains("controllerManager"));
        assert!(!err.is_retryable());
        assert_eq!(err.cluster(), None);
    }

    /// Story: a failed submission keeps the provider error intact
    #[test]
    fn story_submission_failure_wraps_client_error() {
        let err = Error::SubmissionFailed {
            cluster: "prod".into(),
            source: ApiError::service("InvalidParameterException", "unsupported log type"),
        };
        assert_eq!(err.cluster(), Some("prod"));
        assert!(err.to_string().contains("InvalidParameterException"));
        assert!(!err.is_retryable());

        let source = std::error::Error::source(&err).expect("source should be preserved");
        assert!(source.to_string().contains("unsupported log type"));
    }

    /// Story: transport hiccups while polling are retryable
    #[test]
    fn story_poll_failure_is_retryable() {
        let err = Error::PollFailed {
            cluster: "prod".into(),
            update_id: "u123".into(),
            source: ApiError::Transport("connection reset".into()),
        };
        assert!(err.is_retryable());
        assert_eq!(err.update_id(), Some("u123"));
        assert_eq!(err.kind(), "poll_failed");
    }

    /// Story: provider-side failure reports the update id and details
    #[test]
    fn story_operation_failed_renders_provider_details() {
        let err = Error::OperationFailed {
            update_id: "u123".into(),
            update_type: UpdateType::LoggingUpdate,
            errors: vec![ErrorDetail {
                error_code: Some("AccessDenied".into()),
                error_message: Some("role cannot write log group".into()),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("u123"));
        assert!(msg.contains("LoggingUpdate"));
        assert!(msg.contains("AccessDenied"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn operation_failed_without_details_has_no_trailing_separator() {
        let err = Error::OperationFailed {
            update_id: "u1".into(),
            update_type: UpdateType::LoggingUpdate,
            errors: vec![],
        };
        assert_eq!(err.to_string(), "update u1 (LoggingUpdate) failed");
    }

    /// Story: provider cancellation and caller cancellation stay distinguishable
    #[test]
    fn story_cancellation_kinds_are_distinct() {
        let provider = Error::OperationCancelled {
            update_id: "u1".into(),
            update_type: UpdateType::LoggingUpdate,
        };
        let caller = Error::CancelledByCaller {
            update_id: "u1".into(),
            reason: "cancellation requested".into(),
        };
        assert_ne!(provider.kind(), caller.kind());
        assert!(provider.to_string().contains("by the provider"));
        assert!(caller.to_string().contains("cancellation requested"));
        assert_eq!(provider.update_id(), caller.update_id());
    }

    #[test]
    fn validation_for_field_keeps_path() {
        let err = Error::validation_for_field("dev", "metadata.name", "must not be empty");
        match &err {
            Error::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("metadata.name"));
            }
            _ => panic!("Expected Validation variant"),
        }
        assert_eq!(err.cluster(), Some("dev"));
    }
}
