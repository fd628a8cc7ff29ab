//! Control-plane logging reconciler
//!
//! Drives one logging update per call: partition the supported facilities,
//! submit both logging groups, then poll the resulting update to a terminal
//! status. Submission is never retried here; callers decide whether to run
//! the whole reconciliation again (see [`Error::is_retryable`]).
//!
//! Callers must not reconcile the same cluster concurrently.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use stratus_common::eks::LogSetup;
use stratus_common::metrics::{record_update, UpdateResult, UpdateTimer};
use stratus_common::{expand, ClusterConfig, Error, LogFacility, PollConfig, Result};

use crate::client::EksClient;
use crate::payload::{build_log_setups, LoggingPlan, LoggingState};
use crate::poller::{PollOutcome, UpdatePoller};

/// Result of [`LoggingReconciler::apply`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Current configuration already matched; nothing was submitted
    Unchanged(LoggingPlan),
    /// An update was submitted and reached Successful
    Updated {
        /// The change that was applied
        plan: LoggingPlan,
        /// Terminal poll result
        outcome: PollOutcome,
    },
}

/// Reconciles a cluster's control-plane logging against the provider
pub struct LoggingReconciler {
    client: Arc<dyn EksClient>,
    poll: PollConfig,
}

impl LoggingReconciler {
    /// Create a reconciler using `client` for provider calls
    pub fn new(client: Arc<dyn EksClient>, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    /// Enable exactly `enabled` and disable the rest of `supported`.
    ///
    /// Always submits, even when the provider already matches; use
    /// [`Self::apply`] to skip no-op updates.
    #[instrument(skip(self, cluster, enabled, supported, cancel), fields(cluster = %cluster))]
    pub async fn reconcile(
        &self,
        cluster: &str,
        enabled: &[LogFacility],
        supported: &[LogFacility],
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let logging = build_log_setups(enabled, supported)?;
        let timer = UpdateTimer::start(cluster);

        match self.submit_and_wait(cluster, &logging, cancel).await {
            Ok(outcome) => {
                timer.success();
                Ok(outcome)
            }
            Err(e) => {
                timer.error(e.kind());
                Err(e)
            }
        }
    }

    async fn submit_and_wait(
        &self,
        cluster: &str,
        logging: &[LogSetup; 2],
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let [enable, disable] = logging;
        info!(
            enable = ?enable.types,
            disable = ?disable.types,
            "Submitting logging update"
        );

        let update = self
            .client
            .update_cluster_logging(cluster, logging)
            .await
            .map_err(|source| Error::SubmissionFailed {
                cluster: cluster.to_string(),
                source,
            })?;

        debug!(
            update_id = %update.id,
            update_type = %update.update_type,
            "Logging update submitted"
        );

        UpdatePoller::new(self.client.as_ref(), cluster, update.handle(), &self.poll)
            .wait(cancel)
            .await
    }

    /// Current logging state as reported by the provider
    pub async fn current(&self, cluster: &str) -> Result<LoggingState> {
        let setups = self
            .client
            .describe_cluster_logging(cluster)
            .await
            .map_err(|source| Error::DescribeFailed {
                cluster: cluster.to_string(),
                source,
            })?;
        Ok(LoggingState::from_log_setups(&setups))
    }

    /// Expand `requested` and diff it against the provider's current state
    pub async fn plan<S: AsRef<str>>(
        &self,
        cluster: &str,
        requested: &[S],
    ) -> Result<LoggingPlan> {
        let desired = expand(requested)?;
        let current = self.current(cluster).await?;
        Ok(LoggingPlan::new(desired, current))
    }

    /// Bring the cluster to `requested`, skipping the update when nothing
    /// would change
    #[instrument(skip(self, cluster, requested, cancel), fields(cluster = %cluster))]
    pub async fn apply<S: AsRef<str>>(
        &self,
        cluster: &str,
        requested: &[S],
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome> {
        let plan = match self.plan(cluster, requested).await {
            Ok(plan) => plan,
            Err(e) => {
                record_update(cluster, UpdateResult::Error, Some(e.kind()));
                return Err(e);
            }
        };

        if plan.is_noop() {
            info!(enabled = ?plan.current.enabled, "Logging configuration already up to date");
            record_update(cluster, UpdateResult::Unchanged, None);
            return Ok(ApplyOutcome::Unchanged(plan));
        }

        info!(
            to_enable = ?plan.to_enable,
            to_disable = ?plan.to_disable,
            "Logging configuration differs from desired"
        );
        let outcome = self
            .reconcile(cluster, &plan.desired, &LogFacility::ALL, cancel)
            .await?;
        Ok(ApplyOutcome::Updated { plan, outcome })
    }

    /// Validate a cluster config document and apply its logging declaration
    pub async fn apply_config(
        &self,
        config: &ClusterConfig,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome> {
        config.validate()?;
        self.apply(&config.metadata.name, config.requested_facilities(), cancel)
            .await
    }
}
