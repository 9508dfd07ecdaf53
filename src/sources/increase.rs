//! Increase adapter
//!
//! Looks up one ACH transfer by id.

use super::types::AchTransfer;
use super::Lookup;
use crate::config::IncreaseConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;

const SOURCE_NAME: &str = "increase";

/// Client for the Increase transaction API
#[derive(Debug)]
pub struct IncreaseClient {
    http: HttpClient,
}

impl IncreaseClient {
    /// Create a client from validated settings
    pub fn new(config: &IncreaseConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .source_name(SOURCE_NAME)
            .base_url(&config.base_url)
            .build();
        Ok(Self {
            http: HttpClient::with_auth(http_config, config.auth())?,
        })
    }

    /// Fetch an ACH transfer
    pub async fn ach_transfer(&self, transfer_id: &str) -> Result<AchTransfer> {
        self.http
            .get_json(&format!("/ach_transfers/{transfer_id}"), RequestConfig::new())
            .await
    }
}

#[async_trait]
impl Lookup for IncreaseClient {
    type Record = AchTransfer;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn lookup(&self, key: &str) -> Result<AchTransfer> {
        self.ach_transfer(key).await
    }
}
