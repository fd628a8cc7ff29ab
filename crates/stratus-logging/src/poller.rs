//! Update status polling
//!
//! An [`UpdatePoller`] owns one provider update handle and drives it from
//! `InProgress` to a terminal status. The only suspension point is the wait
//! between queries, which races the caller's cancellation token.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stratus_common::eks::{Update, UpdateHandle, UpdateStatus};
use stratus_common::metrics::record_status_query;
use stratus_common::{Error, PollConfig, Result};

use crate::client::EksClient;

const CANCELLED_REASON: &str = "cancellation requested";

/// Successful end of polling
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOutcome {
    /// The update as last reported by the provider
    pub update: Update,
    /// Status queries issued, including the final one
    pub status_queries: u32,
}

/// Poll state for a single provider update
pub struct UpdatePoller<'a> {
    client: &'a dyn EksClient,
    cluster: &'a str,
    handle: UpdateHandle,
    interval: Duration,
    deadline: Option<Instant>,
    status_queries: u32,
}

impl<'a> UpdatePoller<'a> {
    /// Create a poller for `handle`; the deadline starts counting now
    pub fn new(
        client: &'a dyn EksClient,
        cluster: &'a str,
        handle: UpdateHandle,
        config: &PollConfig,
    ) -> Self {
        Self {
            client,
            cluster,
            handle,
            interval: config.interval(),
            // A timeout past the clock's range never expires
            deadline: config
                .timeout()
                .and_then(|t| Instant::now().checked_add(t)),
            status_queries: 0,
        }
    }

    /// Poll until the update reaches a terminal status.
    ///
    /// Cancellation and the deadline are checked before every query and
    /// during every wait. Failed and Cancelled statuses end polling
    /// immediately with their own error kinds.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Result<PollOutcome> {
        loop {
            self.check_continue(cancel)?;

            let update = self.query().await?;
            match update.status {
                UpdateStatus::InProgress => {
                    debug!(
                        cluster = %self.cluster,
                        update_id = %self.handle.id,
                        queries = self.status_queries,
                        "Update still in progress"
                    );
                    self.pause(cancel).await?;
                }
                UpdateStatus::Successful => {
                    info!(
                        cluster = %self.cluster,
                        update_id = %self.handle.id,
                        queries = self.status_queries,
                        "Update successful"
                    );
                    return Ok(PollOutcome {
                        update,
                        status_queries: self.status_queries,
                    });
                }
                UpdateStatus::Failed => {
                    warn!(
                        cluster = %self.cluster,
                        update_id = %self.handle.id,
                        errors = ?update.errors,
                        "Update failed"
                    );
                    return Err(Error::OperationFailed {
                        update_id: self.handle.id,
                        update_type: self.handle.update_type,
                        errors: update.errors,
                    });
                }
                UpdateStatus::Cancelled => {
                    warn!(
                        cluster = %self.cluster,
                        update_id = %self.handle.id,
                        "Update cancelled by provider"
                    );
                    return Err(Error::OperationCancelled {
                        update_id: self.handle.id,
                        update_type: self.handle.update_type,
                    });
                }
            }
        }
    }

    async fn query(&mut self) -> Result<Update> {
        self.status_queries += 1;
        match self
            .client
            .describe_update(self.cluster, &self.handle.id)
            .await
        {
            Ok(update) => {
                record_status_query(self.cluster, &update.status.to_string());
                Ok(update)
            }
            Err(source) => {
                record_status_query(self.cluster, "error");
                Err(Error::PollFailed {
                    cluster: self.cluster.to_string(),
                    update_id: self.handle.id.clone(),
                    source,
                })
            }
        }
    }

    fn check_continue(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(self.stopped(CANCELLED_REASON));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(self.stopped("deadline exceeded"));
            }
        }
        Ok(())
    }

    async fn pause(&self, cancel: &CancellationToken) -> Result<()> {
        let wait = match self.deadline {
            Some(deadline) => self
                .interval
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.interval,
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(self.stopped(CANCELLED_REASON)),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    fn stopped(&self, reason: &str) -> Error {
        info!(
            cluster = %self.cluster,
            update_id = %self.handle.id,
            reason,
            "Stopped waiting for update"
        );
        Error::CancelledByCaller {
            update_id: self.handle.id.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use stratus_common::eks::{ApiError, ErrorDetail, UpdateType};

    use crate::client::MockEksClient;

    fn update(status: UpdateStatus) -> Update {
        Update {
            id: "u123".to_string(),
            update_type: UpdateType::LoggingUpdate,
            status,
            errors: vec![],
        }
    }

    fn handle() -> UpdateHandle {
        update(UpdateStatus::InProgress).handle()
    }

    fn fast() -> PollConfig {
        PollConfig::with_interval(Duration::from_millis(1)).unwrap()
    }

    /// Mock answering status queries from a script, counting calls
    fn scripted(statuses: Vec<UpdateStatus>) -> (MockEksClient, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut mock = MockEksClient::new();
        mock.expect_describe_update()
            .times(statuses.len())
            .returning(move |_, _| {
                let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
                Ok(update(statuses[n]))
            });
        (mock, calls)
    }

    #[tokio::test]
    async fn in_progress_then_successful_takes_two_queries() {
        let (mock, calls) = scripted(vec![UpdateStatus::InProgress, UpdateStatus::Successful]);
        let outcome = UpdatePoller::new(&mock, "prod", handle(), &fast())
            .wait(&CancellationToken::new())
            .await
            .expect("update should succeed");

        assert_eq!(outcome.status_queries, 2);
        assert_eq!(outcome.update.status, UpdateStatus::Successful);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_on_first_query_stops_polling() {
        let mut mock = MockEksClient::new();
        mock.expect_describe_update().times(1).returning(|_, _| {
            Ok(Update {
                errors: vec![ErrorDetail {
                    error_code: Some("AccessDenied".into()),
                    error_message: None,
                }],
                ..update(UpdateStatus::Failed)
            })
        });

        let err = UpdatePoller::new(&mock, "prod", handle(), &fast())
            .wait(&CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::OperationFailed {
                update_id,
                update_type,
                errors,
            } => {
                assert_eq!(update_id, "u123");
                assert_eq!(update_type, UpdateType::LoggingUpdate);
                assert_eq!(errors.len(), 1);
            }
            other => panic!("Expected OperationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_cancellation_is_reported() {
        let (mock, _) = scripted(vec![UpdateStatus::InProgress, UpdateStatus::Cancelled]);
        let err = UpdatePoller::new(&mock, "prod", handle(), &fast())
            .wait(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OperationCancelled { .. }));
    }

    #[tokio::test]
    async fn query_errors_are_propagated() {
        let mut mock = MockEksClient::new();
        mock.expect_describe_update()
            .times(1)
            .returning(|_, _| Err(ApiError::Transport("connection reset".into())));

        let err = UpdatePoller::new(&mock, "prod", handle(), &fast())
            .wait(&CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::PollFailed {
                cluster,
                update_id,
                source,
            } => {
                assert_eq!(cluster, "prod");
                assert_eq!(update_id, "u123");
                assert_eq!(source, ApiError::Transport("connection reset".into()));
            }
            other => panic!("Expected PollFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_query() {
        let mut mock = MockEksClient::new();
        mock.expect_describe_update().never();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = UpdatePoller::new(&mock, "prod", handle(), &fast())
            .wait(&cancel)
            .await
            .unwrap_err();
        match err {
            Error::CancelledByCaller { update_id, reason } => {
                assert_eq!(update_id, "u123");
                assert_eq!(reason, CANCELLED_REASON);
            }
            other => panic!("Expected CancelledByCaller, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let mut mock = MockEksClient::new();
        mock.expect_describe_update()
            .times(1)
            .returning(|_, _| Ok(update(UpdateStatus::InProgress)));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let slow = PollConfig::with_interval(Duration::from_secs(3600)).unwrap();
        let err = UpdatePoller::new(&mock, "prod", handle(), &slow)
            .wait(&cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CancelledByCaller { .. }));
    }

    #[tokio::test]
    async fn deadline_bounds_total_wait() {
        let mut mock = MockEksClient::new();
        mock.expect_describe_update()
            .returning(|_, _| Ok(update(UpdateStatus::InProgress)));

        let config = PollConfig::with_interval(Duration::from_millis(5))
            .unwrap()
            .with_timeout(Duration::from_millis(30));
        let err = UpdatePoller::new(&mock, "prod", handle(), &config)
            .wait(&CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::CancelledByCaller { reason, .. } => assert_eq!(reason, "deadline exceeded"),
            other => panic!("Expected CancelledByCaller, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrepresentable_timeout_means_no_deadline() {
        let (mock, calls) = scripted(vec![UpdateStatus::InProgress, UpdateStatus::Successful]);
        let config = fast().with_timeout(Duration::from_secs(u64::MAX));
        let outcome = UpdatePoller::new(&mock, "prod", handle(), &config)
            .wait(&CancellationToken::new())
            .await
            .expect("update should succeed");

        assert_eq!(outcome.status_queries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
