//! Tests for the batch lookup cache

use super::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Answers from a fixed table and records every request
struct TableSource {
    table: HashMap<String, String>,
    /// Extra entries returned regardless of what was asked
    unsolicited: HashMap<String, String>,
    fail: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl TableSource {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            table: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            unsolicited: HashMap::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchSource for TableSource {
    type Value = String;

    fn name(&self) -> &str {
        "table"
    }

    async fn fetch_batch(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        self.calls.lock().unwrap().push(keys.to_vec());
        if self.fail {
            return Err(Error::unavailable("table", "connection reset"));
        }
        let mut found: HashMap<String, String> = keys
            .iter()
            .filter_map(|k| self.table.get(k).map(|v| (k.clone(), v.clone())))
            .collect();
        found.extend(self.unsolicited.clone());
        Ok(found)
    }
}

fn keys(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn test_build_single_round_trip() {
    let source = TableSource::new(&[("ba_1", "Grace"), ("ba_3", "Alan")]);
    let lookup = BatchLookup::build(&source, keys(&["ba_1", "ba_2", "ba_3"])).await;

    assert_eq!(source.calls().len(), 1);
    assert_eq!(lookup.len(), 2);
    assert_eq!(lookup.get("ba_1").map(String::as_str), Some("Grace"));
    assert_eq!(lookup.get("ba_2"), None);
    assert!(lookup.contains("ba_3"));
}

#[tokio::test]
async fn test_failure_yields_empty_map() {
    let source = TableSource::failing();
    let lookup = BatchLookup::build(&source, keys(&["ba_1", "ba_2"])).await;

    assert!(lookup.is_empty());
    assert_eq!(lookup.get("ba_1"), None);
}

#[tokio::test]
async fn test_result_keys_are_subset_of_requested() {
    let mut source = TableSource::new(&[("ba_1", "Grace")]);
    source
        .unsolicited
        .insert("ba_other".to_string(), "Stranger".to_string());

    let lookup = BatchLookup::build(&source, keys(&["ba_1", "ba_2"])).await;

    let mut present: Vec<&str> = lookup.keys().collect();
    present.sort_unstable();
    assert_eq!(present, vec!["ba_1"]);
}

#[tokio::test]
async fn test_duplicate_keys_requested_once() {
    let source = TableSource::new(&[("ba_1", "Grace")]);
    BatchLookup::build(&source, keys(&["ba_1", "ba_1", "ba_2", "ba_1"])).await;

    assert_eq!(source.calls(), vec![keys(&["ba_1", "ba_2"])]);
}

#[tokio::test]
async fn test_extend_never_refetches_resolved_keys() {
    let source = TableSource::new(&[("ba_1", "Grace"), ("ba_2", "Alan")]);
    let mut lookup = BatchLookup::new();

    assert_eq!(lookup.extend(&source, keys(&["ba_1", "ba_9"])).await, 2);
    assert_eq!(lookup.extend(&source, keys(&["ba_1", "ba_9"])).await, 0);
    assert_eq!(lookup.extend(&source, keys(&["ba_1", "ba_2"])).await, 1);

    assert_eq!(
        source.calls(),
        vec![keys(&["ba_1", "ba_9"]), keys(&["ba_2"])]
    );
    assert_eq!(lookup.len(), 2);
}

#[tokio::test]
async fn test_failed_keys_can_be_retried_later() {
    let failing = TableSource::failing();
    let mut lookup = BatchLookup::new();
    lookup.extend(&failing, keys(&["ba_1"])).await;
    assert!(lookup.is_empty());

    let healthy = TableSource::new(&[("ba_1", "Grace")]);
    assert_eq!(lookup.extend(&healthy, keys(&["ba_1"])).await, 1);
    assert!(lookup.contains("ba_1"));
}

#[tokio::test]
async fn test_empty_key_set_skips_query() {
    let source = TableSource::new(&[]);
    let lookup = BatchLookup::build(&source, Vec::new()).await;
    assert!(lookup.is_empty());
    assert!(source.calls().is_empty());
}
