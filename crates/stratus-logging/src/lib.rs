//! Control-plane logging reconciliation for managed clusters
//!
//! Turns a requested set of logging facilities into the provider's
//! enabled/disabled logging groups, submits the update, and waits for the
//! provider to report a terminal status.
//!
//! # Modules
//!
//! - [`client`] - Provider client trait (mocked in tests)
//! - [`payload`] - Enabled/disabled partition, current state, change plans
//! - [`poller`] - Update status polling with cancellation
//! - [`reconciler`] - Entry points: reconcile, current, plan, apply

pub mod client;
pub mod payload;
pub mod poller;
pub mod reconciler;

pub use client::EksClient;
pub use payload::{build_log_setups, disabled_facilities, LoggingPlan, LoggingState};
pub use poller::{PollOutcome, UpdatePoller};
pub use reconciler::{ApplyOutcome, LoggingReconciler};
