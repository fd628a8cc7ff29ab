//! Logging update payloads and change planning
//!
//! Pure functions: partition the supported facilities into the enabled and
//! disabled groups sent to the provider, fold the provider's current groups
//! back into a state, and diff desired against current.

use stratus_common::eks::LogSetup;
use stratus_common::{Error, LogFacility, Result};

/// Supported facilities not in `enabled`, in `supported` order
pub fn disabled_facilities(
    enabled: &[LogFacility],
    supported: &[LogFacility],
) -> Vec<LogFacility> {
    supported
        .iter()
        .filter(|f| !enabled.contains(f))
        .copied()
        .collect()
}

/// Build the `[enabled, disabled]` logging groups for an update request.
///
/// Every enabled facility must be supported; the two groups then partition
/// `supported` exactly. Either group may be empty.
pub fn build_log_setups(
    enabled: &[LogFacility],
    supported: &[LogFacility],
) -> Result<[LogSetup; 2]> {
    let unsupported: Vec<String> = enabled
        .iter()
        .filter(|f| !supported.contains(f))
        .map(ToString::to_string)
        .collect();
    if !unsupported.is_empty() {
        return Err(Error::unknown_facilities(unsupported));
    }

    Ok([
        LogSetup::enable(enabled.to_vec()),
        LogSetup::disable(disabled_facilities(enabled, supported)),
    ])
}

/// Logging facilities currently on and off for a cluster
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggingState {
    /// Facilities currently delivering logs, canonical order
    pub enabled: Vec<LogFacility>,
    /// Every other supported facility, canonical order
    pub disabled: Vec<LogFacility>,
}

impl LoggingState {
    /// Fold provider logging groups into a state.
    ///
    /// A facility is enabled if any enabled group lists it; facilities the
    /// provider does not mention count as disabled.
    pub fn from_log_setups(setups: &[LogSetup]) -> Self {
        let (enabled, disabled) = LogFacility::ALL.into_iter().partition(|f| {
            setups
                .iter()
                .any(|setup| setup.enabled && setup.types.contains(f))
        });
        Self { enabled, disabled }
    }

    /// Whether a facility is currently enabled
    pub fn is_enabled(&self, facility: LogFacility) -> bool {
        self.enabled.contains(&facility)
    }
}

/// Difference between the requested and the current logging configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingPlan {
    /// Expanded requested facilities
    pub desired: Vec<LogFacility>,
    /// What the provider reports now
    pub current: LoggingState,
    /// Facilities that will be turned on, canonical order
    pub to_enable: Vec<LogFacility>,
    /// Facilities that will be turned off, canonical order
    pub to_disable: Vec<LogFacility>,
}

impl LoggingPlan {
    /// Diff desired facilities against the current state
    pub fn new(desired: Vec<LogFacility>, current: LoggingState) -> Self {
        let to_enable = LogFacility::ALL
            .into_iter()
            .filter(|f| desired.contains(f) && !current.is_enabled(*f))
            .collect();
        let to_disable = LogFacility::ALL
            .into_iter()
            .filter(|f| !desired.contains(f) && current.is_enabled(*f))
            .collect();
        Self {
            desired,
            current,
            to_enable,
            to_disable,
        }
    }

    /// Whether applying the plan would change nothing
    pub fn is_noop(&self) -> bool {
        self.to_enable.is_empty() && self.to_disable.is_empty()
    }
}
