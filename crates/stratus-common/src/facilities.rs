//! Control-plane logging facilities
//!
//! A facility is a named category of control-plane log output. The set of
//! facilities the provider understands is fixed; callers request a subset of
//! it using explicit names, the wildcard tokens `*` / `all`, or an empty list
//! meaning "none".

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tokens that expand to every supported facility
pub const WILDCARD_TOKENS: [&str; 2] = ["*", "all"];

/// A control-plane logging facility
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum LogFacility {
    /// Kubernetes API server logs
    Api,
    /// Kubernetes audit logs
    Audit,
    /// Authenticator (IAM) logs
    Authenticator,
    /// Controller manager logs
    ControllerManager,
    /// Scheduler logs
    Scheduler,
}

impl LogFacility {
    /// Every supported facility, in canonical order
    pub const ALL: [LogFacility; 5] = [
        LogFacility::Api,
        LogFacility::Audit,
        LogFacility::Authenticator,
        LogFacility::ControllerManager,
        LogFacility::Scheduler,
    ];

    /// Provider name of this facility
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Audit => "audit",
            Self::Authenticator => "authenticator",
            Self::ControllerManager => "controllerManager",
            Self::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for LogFacility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFacility {
    type Err = Error;

    /// Case-sensitive match against the provider names
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::unknown_facilities(vec![s.to_string()]))
    }
}

/// Names of every supported facility, in canonical order
pub fn supported_facility_names() -> Vec<String> {
    LogFacility::ALL.iter().map(|f| f.to_string()).collect()
}

/// Render facilities back to their provider names
pub fn facility_names(facilities: &[LogFacility]) -> Vec<String> {
    facilities.iter().map(|f| f.to_string()).collect()
}

fn is_wildcard(token: &str) -> bool {
    WILDCARD_TOKENS.contains(&token)
}

/// Expand requested facility tokens into the facilities to enable.
///
/// - `[]` enables nothing
/// - a lone `*` or `all` enables every facility in canonical order
/// - otherwise each token must name a supported facility exactly; order and
///   duplicates are preserved
///
/// A wildcard combined with any other token is rejected rather than resolved
/// by precedence. Unknown tokens are all reported together and no partial
/// result is returned.
pub fn expand<S: AsRef<str>>(requested: &[S]) -> Result<Vec<LogFacility>> {
    match requested {
        [] => Ok(Vec::new()),
        [only] if is_wildcard(only.as_ref()) => Ok(LogFacility::ALL.to_vec()),
        tokens => {
            let wildcards: Vec<String> = tokens
                .iter()
                .map(|t| t.as_ref())
                .filter(|t| is_wildcard(t))
                .map(str::to_string)
                .collect();
            if !wildcards.is_empty() {
                return Err(Error::UnknownFacility {
                    tokens: wildcards,
                    message: format!(
                        "wildcard tokens {:?} cannot be combined with other facilities",
                        WILDCARD_TOKENS
                    ),
                });
            }

            let mut enabled = Vec::with_capacity(tokens.len());
            let mut unknown = Vec::new();
            for token in tokens.iter().map(|t| t.as_ref()) {
                match token.parse::<LogFacility>() {
                    Ok(facility) => enabled.push(facility),
                    Err(_) => unknown.push(token.to_string()),
                }
            }

            if unknown.is_empty() {
                Ok(enabled)
            } else {
                Err(Error::unknown_facilities(unknown))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_request_enables_nothing() {
        let requested: Vec<String> = Vec::new();
        assert_eq!(expand(&requested).unwrap(), Vec::<LogFacility>::new());
    }

    #[test]
    fn wildcards_expand_to_all_in_canonical_order() {
        assert_eq!(expand(&["*"]).unwrap(), LogFacility::ALL.to_vec());
        assert_eq!(expand(&["all"]).unwrap(), LogFacility::ALL.to_vec());
        assert_eq!(
            facility_names(&expand(&["all"]).unwrap()),
            names(&["api", "audit", "authenticator", "controllerManager", "scheduler"])
        );
    }

    #[test]
    fn explicit_names_are_returned_unchanged() {
        let cases: [&[&str]; 4] = [
            &["authenticator", "controllerManager"],
            &["audit", "scheduler"],
            &["scheduler", "api"],
            &["api", "audit", "authenticator", "controllerManager", "scheduler"],
        ];
        for case in cases {
            let expanded = expand(case).unwrap();
            assert_eq!(facility_names(&expanded), names(case));
        }
    }

    #[test]
    fn duplicates_are_preserved() {
        let expanded = expand(&["audit", "audit"]).unwrap();
        assert_eq!(expanded, vec![LogFacility::Audit, LogFacility::Audit]);
    }

    #[test]
    fn unknown_tokens_are_all_reported() {
        let err = expand(&["anything", "api", "anyOtherThing"]).unwrap_err();
        match err {
            Error::UnknownFacility { tokens, .. } => {
                assert_eq!(tokens, names(&["anything", "anyOtherThing"]));
            }
            other => panic!("Expected UnknownFacility, got {other:?}"),
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(expand(&["API"]).is_err());
        assert!(expand(&["controllermanager"]).is_err());
        assert!(expand(&["ALL"]).is_err());
    }

    #[test]
    fn wildcard_mixed_with_names_is_rejected() {
        for case in [&["*", "api"][..], &["audit", "all"], &["*", "all"], &["*", "*"]] {
            match expand(case).unwrap_err() {
                Error::UnknownFacility { tokens, message } => {
                    assert!(tokens.iter().all(|t| is_wildcard(t)));
                    assert!(message.contains("cannot be combined"));
                }
                other => panic!("Expected UnknownFacility, got {other:?}"),
            }
        }
    }

    #[test]
    fn expansion_is_idempotent() {
        for case in [&["*"][..], &["audit", "scheduler"], &[]] {
            let once = expand(case).unwrap();
            let twice = expand(&facility_names(&once)).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn facility_names_round_trip_through_from_str() {
        for facility in LogFacility::ALL {
            assert_eq!(facility.as_str().parse::<LogFacility>().unwrap(), facility);
        }
        assert_eq!(supported_facility_names().len(), LogFacility::ALL.len());
    }
}
