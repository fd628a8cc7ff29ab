//! Provider client seam
//!
//! The transport-level SDK lives outside this crate. Production code plugs a
//! real client in behind [`EksClient`]; tests use the generated mock.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use stratus_common::eks::{ApiError, LogSetup, Update};

/// Trait abstracting the provider calls used for logging reconciliation
///
/// Errors are returned exactly as the provider client produced them; callers
/// wrap them with cluster and update context.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EksClient: Send + Sync {
    /// Submit a logging configuration change (`UpdateClusterConfig`)
    ///
    /// Returns the created update, normally `InProgress`.
    async fn update_cluster_logging(
        &self,
        cluster: &str,
        logging: &[LogSetup],
    ) -> Result<Update, ApiError>;

    /// Query an update by id (`DescribeUpdate`)
    async fn describe_update(&self, cluster: &str, update_id: &str) -> Result<Update, ApiError>;

    /// Read the cluster's current logging groups (`DescribeCluster`)
    async fn describe_cluster_logging(&self, cluster: &str) -> Result<Vec<LogSetup>, ApiError>;
}
