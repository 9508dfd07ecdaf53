//! Engine types
//!
//! Configuration and run statistics for the join engine.

use crate::types::{FailurePolicy, QueryKey};

/// Configuration for a join run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// What happens when one top-level key fails
    pub policy: FailurePolicy,
    /// Top-level keys processed at once (1 = sequential)
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::Lenient,
            concurrency: 1,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the number of keys processed at once
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Statistics from a join run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Top-level keys that completed
    pub keys_processed: usize,
    /// Top-level keys that failed, in input order
    pub failed_keys: Vec<QueryKey>,
    /// Primary records fetched
    pub primaries_fetched: usize,
    /// Primary records without a secondary key
    pub primaries_skipped: usize,
    /// Output records produced
    pub records_emitted: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed key
    pub fn add_key(&mut self, outcome: &KeyOutcome<impl Sized>) {
        self.keys_processed += 1;
        self.primaries_fetched += outcome.fetched;
        self.primaries_skipped += outcome.skipped;
        self.records_emitted += outcome.records.len();
    }

    /// Record a failed key
    pub fn add_failure(&mut self, key: impl Into<QueryKey>) {
        self.failed_keys.push(key.into());
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Everything produced for one top-level key
#[derive(Debug, Clone)]
pub struct KeyOutcome<T> {
    /// Records in production order
    pub records: Vec<T>,
    /// Primary records fetched for the key
    pub fetched: usize,
    /// Primary records skipped for lack of a secondary key
    pub skipped: usize,
}

impl<T> KeyOutcome<T> {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            fetched: 0,
            skipped: 0,
        }
    }
}
