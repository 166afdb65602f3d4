//! Errors returned by `GrafanaClient`
//!
use snafu::prelude::*;

/// Errors returned by the grafana-api crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GrafanaError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// The connectivity check at login failed. The url is unreachable,
    /// or the credential was rejected. Fatal: nothing has been written.
    #[snafu(display("Grafana connection not available: {url}: {message}"))]
    Connectivity { url: String, message: String },

    /// Grafana responded with an error status.
    /// Usually means the request was invalid, or there was an internal server error.
    #[snafu(display("Api Server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Deserialization error. This means we didn't deserialize a server response correctly.
    /// If you see this error, please report it as a bug.
    #[snafu(display("Deserialization: {source}"))]
    Deserialization { source: serde_json::Error },

    /// Serialization error. unlikely to occur. If you see this error, please report it as a bug.
    #[snafu(display("Serialization: {source}"))]
    Serialization { source: serde_json::Error },

    /// Expected item was not found. Returned for get-by-id and get-by-uid lookups.
    #[snafu(display("{obj_type} {key} not found"))]
    NotFound { obj_type: String, key: String },

    /// Client is not authenticated. The secret was rejected or has expired.
    #[snafu(display("Client is not authenticated. Check the secret."))]
    Unauthorized,

    /// Client is authenticated, but the credential lacks permission for the operation.
    #[snafu(display("Permission denied: credential lacks permission for the operation"))]
    Forbidden,

    /// Validation error: the server rejected the request body (http 400).
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },
}

impl GrafanaError {
    /// Returns true for the fatal error class that should abort a run
    /// before any further writes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GrafanaError::Connectivity { .. } | GrafanaError::Unauthorized
        )
    }
}
