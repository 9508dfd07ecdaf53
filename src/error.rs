//! Error types for payroll-recon
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The four kinds the pipelines reason about are:
//!
//! - configuration errors (missing or invalid credentials, always fatal)
//! - source unavailable (network failure or non-success status)
//! - source data invalid (malformed response, entity not found)
//! - sink write errors (output file cannot be written, always fatal)

use thiserror::Error;

/// The main error type for payroll-recon
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("{source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("{source_name} returned HTTP {status}: {body}")]
    SourceStatus {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("{source_name} returned invalid data: {message}")]
    SourceDataInvalid {
        source_name: String,
        message: String,
    },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Failed to write {path}: {message}")]
    SinkWrite { path: String, message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source unavailable error
    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a non-success status error
    pub fn status(source_name: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::SourceStatus {
            source_name: source_name.into(),
            status,
            body: body.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceDataInvalid {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" invalid data error for an entity lookup
    pub fn not_found(
        source_name: impl Into<String>,
        kind: &str,
        id: &str,
    ) -> Self {
        Self::invalid_data(source_name, format!("{kind} {id} not found"))
    }

    /// Create a sink write error
    pub fn sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::MissingConfigField { .. } | Error::InvalidConfigValue { .. }
        )
    }

    /// Whether the remote system was unreachable or answered with a failure
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::SourceUnavailable { .. } | Error::SourceStatus { .. })
    }

    /// Whether the remote system answered with data we could not use
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, Error::SourceDataInvalid { .. })
    }

    /// Errors that abort a run regardless of the failure policy
    pub fn is_fatal(&self) -> bool {
        self.is_config() || matches!(self, Error::SinkWrite { .. })
    }
}

/// Result type alias for payroll-recon
pub type Result<T> = std::result::Result<T, Error>;
