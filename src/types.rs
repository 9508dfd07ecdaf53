//! Common types used throughout payroll-recon
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Opaque identifier for one unit of work (payroll run, employer, worker, transfer)
pub type QueryKey = String;

// ============================================================================
// Verbosity
// ============================================================================

/// Log verbosity, quietest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Informational messages only
    #[default]
    Info,
    /// Adds request lines, statuses and per-record decisions
    Debug,
    /// Adds full request and response payloads
    Trace,
}

impl Verbosity {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    ///
    /// Only this crate gets louder; dependencies stay at `info`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Verbosity::Info => "info",
            Verbosity::Debug => "info,payroll_recon=debug",
            Verbosity::Trace => "info,payroll_recon=trace",
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            "trace" => Ok(Verbosity::Trace),
            other => Err(format!("expected info, debug or trace, got '{other}'")),
        }
    }
}

// ============================================================================
// Failure Policy
// ============================================================================

/// What the join engine does when work for one top-level key fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, drop that key's records and continue with the next key
    #[default]
    Lenient,
    /// Abort the run on the first failure
    Strict,
}

impl FailurePolicy {
    /// Whether a failure should abort the run
    pub fn aborts(self) -> bool {
        self == FailurePolicy::Strict
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Lenient => write!(f, "lenient"),
            FailurePolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "isolate" => Ok(FailurePolicy::Lenient),
            "strict" => Ok(FailurePolicy::Strict),
            other => Err(format!("expected strict or lenient, got '{other}'")),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Split a comma separated list of ids, dropping blanks but keeping order and duplicates
pub fn split_ids(raw: &str) -> Vec<QueryKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_parse() {
        assert_eq!("info".parse::<Verbosity>().unwrap(), Verbosity::Info);
        assert_eq!("DEBUG".parse::<Verbosity>().unwrap(), Verbosity::Debug);
        assert_eq!(" trace ".parse::<Verbosity>().unwrap(), Verbosity::Trace);
        assert!("warn".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::Info < Verbosity::Debug);
        assert!(Verbosity::Debug < Verbosity::Trace);
        assert_eq!(Verbosity::default(), Verbosity::Info);
        assert_eq!(Verbosity::Info.as_directive(), "info");
    }

    #[test]
    fn test_verbosity_directive_scoped_to_crate() {
        for verbosity in [Verbosity::Debug, Verbosity::Trace] {
            let directive = verbosity.as_directive();
            assert!(directive.starts_with("info,"));
            assert!(directive.contains("payroll_recon="));
        }
        assert!(Verbosity::Trace.as_directive().ends_with("=trace"));
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(
            "strict".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Strict
        );
        assert_eq!(
            "Lenient".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Lenient
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
        assert!(FailurePolicy::Strict.aborts());
        assert!(!FailurePolicy::Lenient.aborts());
    }

    #[test]
    fn test_split_ids_keeps_order_and_duplicates() {
        assert_eq!(
            split_ids("run_2, run_1,,run_2 "),
            vec!["run_2", "run_1", "run_2"]
        );
        assert!(split_ids("  ").is_empty());
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some("".to_string()).none_if_empty(), None);
        assert_eq!(Some("  ".to_string()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!("".to_string().none_if_empty(), None);
    }
}
