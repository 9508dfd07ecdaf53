//! Runtime configuration
//!
//! Everything is read from environment variables, optionally seeded from a
//! `.env` file. Credentials for each external system are validated lazily by
//! the per-system accessors so a command only fails on the systems it
//! actually talks to, and always before the first request is sent.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::types::{split_ids, FailurePolicy, OptionStringExt, QueryKey, Verbosity};
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

// ============================================================================
// Variable names
// ============================================================================

pub const PAYMENT_ORDERS_API_URL: &str = "PAYMENT_ORDERS_API_URL";
pub const PAYMENT_ORDERS_ORG_ID: &str = "PAYMENT_ORDERS_ORG_ID";
pub const PAYMENT_ORDERS_API_KEY: &str = "PAYMENT_ORDERS_API_KEY";

pub const INCREASE_API_URL: &str = "INCREASE_API_URL";
pub const INCREASE_API_KEY: &str = "INCREASE_API_KEY";

pub const GRAPHQL_URL: &str = "GRAPHQL_URL";
pub const GRAPHQL_AUTH_HEADER: &str = "GRAPHQL_AUTH_HEADER";
pub const GRAPHQL_TOKEN: &str = "GRAPHQL_TOKEN";

pub const GRAPH_DB_URL: &str = "GRAPH_DB_URL";
pub const GRAPH_DB_USER: &str = "GRAPH_DB_USER";
pub const GRAPH_DB_PASSWORD: &str = "GRAPH_DB_PASSWORD";
pub const GRAPH_DB_DATABASE: &str = "GRAPH_DB_DATABASE";

pub const RECON_LOG_LEVEL: &str = "RECON_LOG_LEVEL";
pub const RECON_OUTPUT_DIR: &str = "RECON_OUTPUT_DIR";
pub const RECON_FAILURE_POLICY: &str = "RECON_FAILURE_POLICY";
pub const RECON_CONCURRENCY: &str = "RECON_CONCURRENCY";
pub const RECON_DEFAULT_PAYROLL_RUN_IDS: &str = "RECON_DEFAULT_PAYROLL_RUN_IDS";
pub const RECON_DEFAULT_EMPLOYER_IDS: &str = "RECON_DEFAULT_EMPLOYER_IDS";

const ALL_VARS: &[&str] = &[
    PAYMENT_ORDERS_API_URL,
    PAYMENT_ORDERS_ORG_ID,
    PAYMENT_ORDERS_API_KEY,
    INCREASE_API_URL,
    INCREASE_API_KEY,
    GRAPHQL_URL,
    GRAPHQL_AUTH_HEADER,
    GRAPHQL_TOKEN,
    GRAPH_DB_URL,
    GRAPH_DB_USER,
    GRAPH_DB_PASSWORD,
    GRAPH_DB_DATABASE,
    RECON_LOG_LEVEL,
    RECON_OUTPUT_DIR,
    RECON_FAILURE_POLICY,
    RECON_CONCURRENCY,
    RECON_DEFAULT_PAYROLL_RUN_IDS,
    RECON_DEFAULT_EMPLOYER_IDS,
];

const DEFAULT_PAYMENT_ORDERS_URL: &str = "https://app.moderntreasury.com";
const DEFAULT_INCREASE_URL: &str = "https://api.increase.com";
const DEFAULT_GRAPHQL_AUTH_HEADER: &str = "Authorization";
const DEFAULT_GRAPH_DB_DATABASE: &str = "neo4j";
const DEFAULT_OUTPUT_DIR: &str = "output";

// ============================================================================
// Per-system settings
// ============================================================================

/// Payment-order API settings
#[derive(Debug, Clone)]
pub struct PaymentOrdersConfig {
    pub base_url: String,
    pub organization_id: String,
    pub api_key: String,
}

impl PaymentOrdersConfig {
    /// HTTP Basic with the organization id as user name
    pub fn auth(&self) -> AuthConfig {
        AuthConfig::Basic {
            username: self.organization_id.clone(),
            password: self.api_key.clone(),
        }
    }
}

/// Increase (transaction API) settings
#[derive(Debug, Clone)]
pub struct IncreaseConfig {
    pub base_url: String,
    pub api_key: String,
}

impl IncreaseConfig {
    pub fn auth(&self) -> AuthConfig {
        AuthConfig::Bearer {
            token: self.api_key.clone(),
        }
    }
}

/// GraphQL entity API settings
#[derive(Debug, Clone)]
pub struct GraphQlConfig {
    pub url: String,
    pub auth_header: String,
    pub token: String,
}

impl GraphQlConfig {
    /// `Authorization` gets a bearer token, any other header carries the raw secret
    pub fn auth(&self) -> AuthConfig {
        if self.auth_header.eq_ignore_ascii_case("authorization") {
            AuthConfig::Bearer {
                token: self.token.clone(),
            }
        } else {
            AuthConfig::ApiKey {
                header_name: self.auth_header.clone(),
                value: self.token.clone(),
            }
        }
    }
}

/// Graph database settings
#[derive(Debug, Clone)]
pub struct GraphDbConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl GraphDbConfig {
    pub fn auth(&self) -> AuthConfig {
        AuthConfig::Basic {
            username: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw, non-blank values of every recognized variable
    vars: HashMap<String, String>,
    /// Log verbosity
    pub verbosity: Verbosity,
    /// Directory the CSV files land in
    pub output_dir: PathBuf,
    /// Overrides each pipeline's default policy when set
    pub failure_policy: Option<FailurePolicy>,
    /// Maximum number of top-level keys processed at once
    pub concurrency: usize,
    /// Payroll runs used when no ids are given
    pub default_payroll_run_ids: Vec<QueryKey>,
    /// Employers used when no ids are given
    pub default_employer_ids: Vec<QueryKey>,
    /// `.env` file the environment was seeded from, if any
    pub env_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vars: HashMap::new(),
            verbosity: Verbosity::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            failure_policy: None,
            concurrency: 1,
            default_payroll_run_ids: Vec::new(),
            default_employer_ids: Vec::new(),
            env_file: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        let env_file = dotenvy::dotenv().ok();
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.env_file = env_file;
        Ok(config)
    }

    /// Load from an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars: HashMap<String, String> = ALL_VARS
            .iter()
            .filter_map(|name| {
                lookup(name)
                    .none_if_empty()
                    .map(|v| ((*name).to_string(), v.trim().to_string()))
            })
            .collect();

        let mut config = Self {
            vars,
            ..Self::default()
        };

        if let Some(raw) = config.get(RECON_LOG_LEVEL) {
            config.verbosity = raw
                .parse()
                .map_err(|e: String| Error::invalid_value(RECON_LOG_LEVEL, e))?;
        }

        if let Some(raw) = config.get(RECON_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(raw);
        }

        if let Some(raw) = config.get(RECON_FAILURE_POLICY) {
            config.failure_policy = Some(
                raw.parse()
                    .map_err(|e: String| Error::invalid_value(RECON_FAILURE_POLICY, e))?,
            );
        }

        if let Some(raw) = config.get(RECON_CONCURRENCY) {
            let n: usize = raw.parse().map_err(|_| {
                Error::invalid_value(RECON_CONCURRENCY, format!("not a number: {raw}"))
            })?;
            if n == 0 {
                return Err(Error::invalid_value(RECON_CONCURRENCY, "must be at least 1"));
            }
            config.concurrency = n;
        }

        config.default_payroll_run_ids = config
            .get(RECON_DEFAULT_PAYROLL_RUN_IDS)
            .map(split_ids)
            .unwrap_or_default();
        config.default_employer_ids = config
            .get(RECON_DEFAULT_EMPLOYER_IDS)
            .map(split_ids)
            .unwrap_or_default();

        Ok(config)
    }

    /// Set a variable directly (tests and programmatic use)
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Raw value of a recognized variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<String> {
        self.get(name)
            .map(String::from)
            .ok_or_else(|| Error::missing_field(name))
    }

    fn url_or(&self, name: &str, default: Option<&str>) -> Result<String> {
        let raw = match (self.get(name), default) {
            (Some(v), _) => v.to_string(),
            (None, Some(d)) => d.to_string(),
            (None, None) => return Err(Error::missing_field(name)),
        };
        Url::parse(&raw).map_err(|e| Error::invalid_value(name, e.to_string()))?;
        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Payment-order API settings, failing if credentials are missing
    pub fn payment_orders(&self) -> Result<PaymentOrdersConfig> {
        Ok(PaymentOrdersConfig {
            base_url: self.url_or(PAYMENT_ORDERS_API_URL, Some(DEFAULT_PAYMENT_ORDERS_URL))?,
            organization_id: self.require(PAYMENT_ORDERS_ORG_ID)?,
            api_key: self.require(PAYMENT_ORDERS_API_KEY)?,
        })
    }

    /// Increase API settings, failing if credentials are missing
    pub fn increase(&self) -> Result<IncreaseConfig> {
        Ok(IncreaseConfig {
            base_url: self.url_or(INCREASE_API_URL, Some(DEFAULT_INCREASE_URL))?,
            api_key: self.require(INCREASE_API_KEY)?,
        })
    }

    /// GraphQL API settings, failing if the endpoint or token is missing
    pub fn graphql(&self) -> Result<GraphQlConfig> {
        Ok(GraphQlConfig {
            url: self.url_or(GRAPHQL_URL, None)?,
            auth_header: self
                .get(GRAPHQL_AUTH_HEADER)
                .unwrap_or(DEFAULT_GRAPHQL_AUTH_HEADER)
                .to_string(),
            token: self.require(GRAPHQL_TOKEN)?,
        })
    }

    /// Graph database settings, failing if the endpoint or credentials are missing
    pub fn graph_db(&self) -> Result<GraphDbConfig> {
        Ok(GraphDbConfig {
            url: self.url_or(GRAPH_DB_URL, None)?,
            user: self.require(GRAPH_DB_USER)?,
            password: self.require(GRAPH_DB_PASSWORD)?,
            database: self
                .get(GRAPH_DB_DATABASE)
                .unwrap_or(DEFAULT_GRAPH_DB_DATABASE)
                .to_string(),
        })
    }
}
