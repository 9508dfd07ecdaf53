//! HTTP client module
//!
//! One [`HttpClient`] per external system. It owns the base URL, the
//! credentials and the source name used to label errors and log lines.
//!
//! # Features
//!
//! - **Error classification**: transport failures and non-success statuses
//!   become "source unavailable", undecodable bodies become "invalid data"
//! - **Tracing**: request line and status at `debug`, payloads at `trace`
//! - **Authentication**: integration with the auth module

mod client;

pub use client::{HttpClient, HttpClientConfig, JsonResponse, RequestConfig};
