//! Authentication module
//!
//! Supports: HTTP Basic, Bearer token and a raw secret in a named header.
//!
//! Credentials are never computed here. They arrive fully formed from
//! [`crate::config`] and the `Authenticator` only attaches them to requests.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
