//! Grafana Rust API Client
//!
//! # Creating a client
//!
//! - [connect](GrafanaClient::connect) - create a client and verify connectivity
//! - [with_config](GrafanaClient::with_config) - create a client with custom configuration
//!
//! Connectivity is verified once, against the permissions endpoint. On a TLS
//! failure (typically a self-signed certificate) the client transparently
//! falls back to unverified-certificate mode and retries once.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    Result,
    auth::Credential,
    config::PERMISSIONS_PATH,
    error::GrafanaError,
    http_client::HttpClient,
};

/// Configuration for the Grafana client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url for all api requests, e.g. "https://grafana.local".
    /// A trailing slash is stripped.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ClientConfig { base_url }
    }
}

/// An ergonomic Grafana management API client.
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    pub(crate) client: Arc<HttpClient>,
    config: ClientConfig,
}

impl GrafanaClient {
    /// Creates a client and verifies connectivity with the given credential.
    ///
    /// Returns `GrafanaError::Connectivity` if the instance is unreachable
    /// or the credential is rejected; callers should treat that as fatal.
    pub async fn connect(url: impl Into<String>, credential: Credential) -> Result<Self> {
        Self::with_config(ClientConfig::new(url), credential).await
    }

    /// Creates a client from a configuration and verifies connectivity.
    pub async fn with_config(config: ClientConfig, credential: Credential) -> Result<Self> {
        debug!(url = %config.base_url, "new client");
        let client = GrafanaClient {
            client: Arc::new(HttpClient::new(config.base_url.clone(), credential)?),
            config,
        };
        client.verify_connectivity().await?;
        Ok(client)
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Checks the connection against the permissions endpoint.
    /// If TLS verification fails, disables certificate checks and tries again.
    async fn verify_connectivity(&self) -> Result<()> {
        let result: Result<serde_json::Value> =
            self.client.get_request(PERMISSIONS_PATH, &[]).await;
        let result = match result {
            Err(GrafanaError::Http { ref source, .. }) if is_tls_error(source) => {
                self.client.disable_cert_verification()?;
                self.client.get_request(PERMISSIONS_PATH, &[]).await
            }
            other => other,
        };
        match result {
            Ok(_) => {
                info!("Connection established: {}", self.config.base_url);
                Ok(())
            }
            Err(err) => Err(GrafanaError::Connectivity {
                url: self.config.base_url.clone(),
                message: err.to_string(),
            }),
        }
    }
}

// reqwest does not expose a TLS error predicate, so walk the source chain
fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    #[test]
    fn test_config_strips_trailing_slash() {
        let config = ClientConfig::new("https://grafana.local/");
        assert_eq!(config.base_url, "https://grafana.local");
    }
}
