//! Common types for Stratus: logging facilities, provider model, errors,
//! configuration and telemetry

#![deny(missing_docs)]

pub mod config;
pub mod eks;
pub mod error;
pub mod facilities;
pub mod metrics;
pub mod telemetry;

pub use config::{ClusterConfig, PollConfig};
pub use error::Error;
pub use facilities::{expand, LogFacility};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
