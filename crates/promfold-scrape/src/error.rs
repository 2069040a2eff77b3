//! Error types for host parsing and fetching.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host is empty")]
    EmptyHost,

    #[error("unsupported scheme {0:?}, only http is supported")]
    UnsupportedScheme(String),

    #[error("invalid port in {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} did not respond within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("response body from {url} is unreadable: {reason}")]
    Body { url: String, reason: String },
}
