//! Source adapters
//!
//! An adapter fetches records from one external system for a query key and
//! normalizes them into the types in [`types`]. Adapters never retry and
//! never swallow errors; what happens on failure is decided by the caller.
//!
//! # Adapters
//!
//! - [`PaymentOrderClient`] - payment orders of a payroll run (list)
//! - [`IncreaseClient`] - ACH transfer by transfer id (single)
//! - [`EntityClient`] - employers and workers over GraphQL (single and list)
//! - [`GraphDb`] - bank accounts and authorizers from the graph database
//!
//! The traits below are the seams the join engine and the batch lookup
//! work against. Views such as [`Employers`] or [`AuthorizerIndex`] adapt a
//! specific client operation to a trait.

mod graph_db;
mod graphql;
mod increase;
mod payment_orders;
pub mod types;

pub use graph_db::{AuthorizerIndex, EmployerAccounts, GraphDb, WorkerAccountIndex};
pub use graphql::{EmployerRosters, EmployerWorkers, Employers, EntityClient, Workers};
pub use increase::IncreaseClient;
pub use payment_orders::PaymentOrderClient;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Fetches every record belonging to a key
#[async_trait]
pub trait Source: Send + Sync {
    /// Normalized record type
    type Record: Send;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch all records for `key`, in the order the system returns them
    async fn fetch(&self, key: &str) -> Result<Vec<Self::Record>>;
}

/// Fetches exactly one entity by key
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Normalized record type
    type Record: Send;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch the entity identified by `key`; absence is an error
    async fn lookup(&self, key: &str) -> Result<Self::Record>;
}

/// Fetches values for many keys in one round trip
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Value stored per key
    type Value: Send;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch values for `keys`; keys without data are simply absent
    async fn fetch_batch(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>>;
}

/// Presents a single-entity lookup as a source yielding one record
#[derive(Debug, Clone, Copy)]
pub struct Single<L>(pub L);

#[async_trait]
impl<L: Lookup> Source for Single<L> {
    type Record = L::Record;

    fn name(&self) -> &str {
        self.0.name()
    }

    async fn fetch(&self, key: &str) -> Result<Vec<Self::Record>> {
        Ok(vec![self.0.lookup(key).await?])
    }
}
