//! Join engine
//!
//! Drives a reconciliation run over an ordered list of top-level keys.
//!
//! # Overview
//!
//! For every key the engine fetches the primary records, derives a
//! secondary key from each one, looks the secondary record up and merges
//! the pair into an output record. Primaries without a secondary key are
//! skipped. [`JoinEngine::collect`] covers the single-source case where each
//! fetched record maps straight to output.
//!
//! Output order always follows input key order, then the order each source
//! returned its records, also when keys are processed concurrently.
//!
//! A failure anywhere inside one key's work fails that key. Under
//! [`FailurePolicy::Lenient`] the key's partial output is dropped and the run
//! moves on; under [`FailurePolicy::Strict`] the run stops. Fatal errors
//! (configuration, sink) stop the run under either policy.

mod types;

pub use types::{EngineConfig, KeyOutcome, RunStats};

use crate::error::Result;
use crate::sources::{Lookup, Source};
use crate::types::{FailurePolicy, QueryKey};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Join engine for one command
pub struct JoinEngine {
    /// Engine configuration
    config: EngineConfig,
    /// Statistics for the most recent run
    stats: RunStats,
}

impl JoinEngine {
    /// Create a new engine
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            stats: RunStats::default(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Failure policy in effect
    pub fn policy(&self) -> FailurePolicy {
        self.config.policy
    }

    /// Get statistics
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = RunStats::default();
    }

    /// Join primary records with secondary records for every key
    ///
    /// `derive` picks the secondary key of a primary record, `None` skips it.
    /// `merge` builds the output from the top-level key and the joined pair.
    pub async fn join<P, S, D, M, T>(
        &mut self,
        keys: &[QueryKey],
        primary: &P,
        secondary: &S,
        derive: D,
        merge: M,
    ) -> Result<Vec<T>>
    where
        P: Source,
        S: Lookup,
        D: Fn(&P::Record) -> Option<String>,
        M: Fn(&str, &P::Record, S::Record) -> T,
    {
        let derive = &derive;
        let merge = &merge;
        self.run(keys, move |key| {
            join_key(key, primary, secondary, derive, merge)
        })
        .await
    }

    /// Map every record of a single source to zero or more outputs
    pub async fn collect<P, M, T>(&mut self, keys: &[QueryKey], source: &P, map: M) -> Result<Vec<T>>
    where
        P: Source,
        M: Fn(&str, P::Record) -> Vec<T>,
    {
        let map = &map;
        self.run(keys, move |key| collect_key(key, source, map)).await
    }

    async fn run<'k, F, Fut, T>(&mut self, keys: &'k [QueryKey], process: F) -> Result<Vec<T>>
    where
        F: Fn(&'k str) -> Fut,
        Fut: Future<Output = Result<KeyOutcome<T>>>,
    {
        let start = Instant::now();
        let policy = self.config.policy;
        self.reset_stats();

        info!(
            keys = keys.len(),
            %policy,
            concurrency = self.config.concurrency,
            "starting run"
        );

        // `buffered` yields results in input order regardless of completion order
        let process = &process;
        let mut pending = stream::iter(keys.iter())
            .map(move |key| async move { (key, process(key.as_str()).await) })
            .buffered(self.config.concurrency);

        let mut records = Vec::new();
        while let Some((key, outcome)) = pending.next().await {
            match outcome {
                Ok(outcome) => {
                    debug!(
                        key = %key,
                        records = outcome.records.len(),
                        skipped = outcome.skipped,
                        "key completed"
                    );
                    self.stats.add_key(&outcome);
                    records.extend(outcome.records);
                }
                Err(e) => {
                    self.stats.add_failure(key.as_str());
                    if policy.aborts() || e.is_fatal() {
                        error!(key = %key, %policy, "aborting run: {e}");
                        self.stats
                            .set_duration(start.elapsed().as_millis() as u64);
                        return Err(e);
                    }
                    error!(key = %key, "skipping key after failure: {e}");
                }
            }
        }

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        if !self.stats.failed_keys.is_empty() {
            warn!(
                failed = self.stats.failed_keys.len(),
                keys = ?self.stats.failed_keys,
                "some keys failed and were left out"
            );
        }
        info!(
            processed = self.stats.keys_processed,
            failed = self.stats.failed_keys.len(),
            records = self.stats.records_emitted,
            skipped = self.stats.primaries_skipped,
            duration_ms = self.stats.duration_ms,
            "run completed"
        );

        Ok(records)
    }
}

async fn join_key<P, S, D, M, T>(
    key: &str,
    primary: &P,
    secondary: &S,
    derive: &D,
    merge: &M,
) -> Result<KeyOutcome<T>>
where
    P: Source,
    S: Lookup,
    D: Fn(&P::Record) -> Option<String>,
    M: Fn(&str, &P::Record, S::Record) -> T,
{
    let primaries = primary.fetch(key).await?;
    debug!(key, source = primary.name(), count = primaries.len(), "fetched primary records");

    let mut outcome = KeyOutcome::new();
    outcome.fetched = primaries.len();

    for (position, record) in primaries.iter().enumerate() {
        let Some(secondary_key) = derive(record) else {
            info!(key, position, source = primary.name(), "no secondary key, record skipped");
            outcome.skipped += 1;
            continue;
        };

        let joined = secondary.lookup(&secondary_key).await.inspect_err(|e| {
            warn!(key, secondary_key = %secondary_key, source = secondary.name(), "lookup failed: {e}");
        })?;
        outcome.records.push(merge(key, record, joined));
    }

    Ok(outcome)
}

async fn collect_key<P, M, T>(key: &str, source: &P, map: &M) -> Result<KeyOutcome<T>>
where
    P: Source,
    M: Fn(&str, P::Record) -> Vec<T>,
{
    let fetched = source.fetch(key).await?;
    debug!(key, source = source.name(), count = fetched.len(), "fetched records");

    let mut outcome = KeyOutcome::new();
    outcome.fetched = fetched.len();
    for record in fetched {
        outcome.records.extend(map(key, record));
    }
    Ok(outcome)
}
