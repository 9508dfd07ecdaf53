//! Batch lookup cache
//!
//! When the keys needing enrichment are known up front, one bulk query
//! replaces a round trip per key. The resulting map lives for one command
//! invocation.
//!
//! A failed bulk query never fails the command: the cache simply has no
//! entry for those keys, and callers treat a missing entry as "no
//! enrichment available".

use crate::sources::BatchSource;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// In-memory results of bulk lookups
#[derive(Debug, Clone)]
pub struct BatchLookup<V> {
    entries: HashMap<String, V>,
    /// Keys already answered by a successful bulk query, with or without data
    resolved: HashSet<String>,
}

impl<V> Default for BatchLookup<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            resolved: HashSet::new(),
        }
    }
}

impl<V> BatchLookup<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache for `keys` with a single bulk query
    pub async fn build<S, I>(source: &S, keys: I) -> Self
    where
        S: BatchSource<Value = V>,
        I: IntoIterator<Item = String>,
    {
        let mut lookup = Self::new();
        lookup.extend(source, keys).await;
        lookup
    }

    /// Fetch the keys not resolved yet; returns how many were requested
    pub async fn extend<S, I>(&mut self, source: &S, keys: I) -> usize
    where
        S: BatchSource<Value = V>,
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let missing: Vec<String> = keys
            .into_iter()
            .filter(|k| !self.resolved.contains(k) && seen.insert(k.clone()))
            .collect();

        if missing.is_empty() {
            debug!(source = source.name(), "batch lookup fully cached");
            return 0;
        }

        match source.fetch_batch(&missing).await {
            Ok(found) => {
                let requested: HashSet<&String> = missing.iter().collect();
                let mut hits = 0usize;
                for (key, value) in found {
                    if requested.contains(&key) {
                        self.entries.insert(key, value);
                        hits += 1;
                    }
                }
                debug!(
                    source = source.name(),
                    requested = missing.len(),
                    hits,
                    "batch lookup completed"
                );
                self.resolved.extend(missing.iter().cloned());
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    requested = missing.len(),
                    "batch lookup failed, continuing without enrichment: {e}"
                );
            }
        }

        missing.len()
    }

    /// Cached value for `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Whether `key` has a value
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys with a value
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has a value
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys with a value, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests;
