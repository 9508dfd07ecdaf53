//! Payment-order adapter
//!
//! Lists the payment orders tagged with a payroll run id. The API pages with
//! an opaque cursor returned in the `X-After-Cursor` header.

use super::types::PaymentOrder;
use super::Source;
use crate::config::PaymentOrdersConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

const SOURCE_NAME: &str = "payment-orders";
const PAGE_SIZE: usize = 100;
const AFTER_CURSOR_HEADER: &str = "X-After-Cursor";
const PAYROLL_RUN_METADATA_KEY: &str = "metadata[payroll_run_id]";

/// Client for the payment-order API
#[derive(Debug)]
pub struct PaymentOrderClient {
    http: HttpClient,
}

impl PaymentOrderClient {
    /// Create a client from validated settings
    pub fn new(config: &PaymentOrdersConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .source_name(SOURCE_NAME)
            .base_url(&config.base_url)
            .build();
        Ok(Self {
            http: HttpClient::with_auth(http_config, config.auth())?,
        })
    }

    /// All payment orders of a payroll run, following pagination to the end
    pub async fn payment_orders_for_run(&self, payroll_run_id: &str) -> Result<Vec<PaymentOrder>> {
        let mut orders = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            let mut request = RequestConfig::new()
                .query(PAYROLL_RUN_METADATA_KEY, payroll_run_id)
                .query("per_page", PAGE_SIZE.to_string());
            if let Some(ref after) = cursor {
                request = request.query("after_cursor", after);
            }

            let response = self
                .http
                .send_json::<Vec<PaymentOrder>>(Method::GET, "/api/payment_orders", request)
                .await?;

            debug!(
                payroll_run_id,
                page,
                count = response.body.len(),
                "fetched payment orders page"
            );

            cursor = response
                .header(AFTER_CURSOR_HEADER)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from);
            orders.extend(response.body);

            if cursor.is_none() {
                break;
            }
        }

        Ok(orders)
    }
}

#[async_trait]
impl Source for PaymentOrderClient {
    type Record = PaymentOrder;

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, key: &str) -> Result<Vec<PaymentOrder>> {
        self.payment_orders_for_run(key).await
    }
}
