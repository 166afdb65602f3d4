//! HttpClient middleware used by GrafanaClient
//!
//! Responsible for
//!  - handling all HTTP api requests
//!  - logging/tracing
//!  - retries and backoff (for timeouts, connection errors, and server busy)
//!  - falling back to unverified-certificate mode when the instance has a
//!    self-signed certificate

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{
    Method, StatusCode,
    header::{HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use snafu::prelude::*;
use tracing::{debug, error, trace, warn};

use crate::{
    Result,
    auth::Credential,
    config::{MAX_RETRIES, PROVENANCE_HEADER, USER_AGENT},
    error::{GrafanaError, HttpSnafu, SerializationSnafu},
};

/// status codes where it's ok to retry and backoff
fn retry_for_status(code: StatusCode) -> bool {
    matches!(
        code,
        StatusCode::TOO_MANY_REQUESTS /* 429 */
        | StatusCode::REQUEST_TIMEOUT /* 408 */
        | StatusCode::GATEWAY_TIMEOUT /* 504 */
    )
}

fn is_idempotent_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

#[derive(Clone, Default)]
pub(crate) struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|b| b.len()).unwrap_or(0))
            .finish()
    }
}

pub(crate) struct HttpClient {
    /// swapped for an unverified-certificate client if the TLS fallback triggers
    client: RwLock<reqwest::Client>,

    /// Base URL for API requests (e.g., "https://grafana.local")
    pub base_url: String,

    credential: Credential,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        reqwest::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    // keeps provisioned alert rules editable on the target instance
    headers.insert(PROVENANCE_HEADER, HeaderValue::from_static("true"));
    headers
}

impl HttpClient {
    pub fn new(base_url: String, credential: Credential) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .build()
            .context(HttpSnafu {
                method: "client-init",
                url: "",
            })?;
        Ok(HttpClient {
            client: RwLock::new(client),
            base_url,
            credential,
        })
    }

    /// Rebuilds the inner client with certificate verification disabled.
    /// Used once, after a TLS failure on the connectivity check.
    pub fn disable_cert_verification(&self) -> Result<()> {
        warn!("TLS verification failed; retrying with certificate verification disabled");
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .danger_accept_invalid_certs(true)
            .build()
            .context(HttpSnafu {
                method: "client-init",
                url: "",
            })?;
        *self.client.write() = client;
        Ok(())
    }

    pub(crate) async fn get_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let req = HttpRequest {
            method: Method::GET,
            path: path.into(),
            query: query.to_vec(),
            body: None,
        };
        self.send(req).await
    }

    pub(crate) async fn post_request<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let req = HttpRequest {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(Bytes::from(
                serde_json::to_vec(body).context(SerializationSnafu)?,
            )),
        };
        self.send(req).await
    }

    /// Makes an authenticated PUT request with JSON body.
    pub(crate) async fn put_request<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let req = HttpRequest {
            method: Method::PUT,
            path: path.into(),
            query: Vec::new(),
            body: Some(Bytes::from(
                serde_json::to_vec(body).context(SerializationSnafu)?,
            )),
        };
        self.send(req).await
    }

    /// Makes an authenticated DELETE request, discarding the response body.
    pub(crate) async fn delete_request(&self, path: &str) -> Result<()> {
        let req = HttpRequest {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        };
        let _: serde_json::Value = self.send(req).await?;
        Ok(())
    }

    /// This function handles all grafana api requests (get, post, put, delete)
    /// - retries up to N(=3) times for connection failures or server timeout,
    ///   idempotent methods only
    /// - maps http error codes into GrafanaErrors
    /// - deserializes json response body into return type T
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: HttpRequest) -> Result<T> {
        let mut attempt = 0u32;
        let full_url = format!("{}{}", self.base_url, req.path);

        loop {
            let builder = self
                .client
                .read()
                .request(req.method.clone(), &full_url)
                .query(&req.query);
            let builder = self.credential.apply(builder);
            let request = builder.body(req.body.clone().unwrap_or_default());
            trace!(target: "grafana::http_json", "{} url={full_url}", req.method);

            match request.send().await {
                Ok(response) => {
                    let code = response.status();
                    match code {
                        ok if ok.is_success() => {
                            // If we fail to fully read the response, don't retry. The server
                            // might believe the request succeeded, and the request may not be
                            // idempotent.
                            let body = response.bytes().await.context(HttpSnafu {
                                method: req.method.to_string(),
                                url: req.path.clone(),
                            })?;
                            trace!(target: "grafana::http_json",
                                "Response path={} body={}",
                                req.path,
                                String::from_utf8_lossy(&body)
                            );
                            // deserialization failure should not be retried
                            return deserialize_json(&body);
                        }
                        StatusCode::BAD_REQUEST /* 400 */ => {
                            let message = response.text().await.unwrap_or("BadRequest".into());
                            error!(?code, ?message, ?req, "http");
                            return Err(GrafanaError::Validation { message });
                        }
                        StatusCode::NOT_FOUND /* 404 */ | StatusCode::GONE /* 410 */ => {
                            let message = response.text().await.unwrap_or("NotFound".into());
                            debug!(?code, ?message, ?req, "http");
                            return Err(GrafanaError::NotFound {
                                obj_type: "Object".into(),
                                key: req.path,
                            });
                        }
                        StatusCode::UNAUTHORIZED /* 401 */ => {
                            let message = response.text().await.unwrap_or("Unauthorized".into());
                            error!(?code, ?message, ?req, "http");
                            return Err(GrafanaError::Unauthorized);
                        }
                        StatusCode::FORBIDDEN /* 403 */ => {
                            let message = response.text().await.unwrap_or("Forbidden".into());
                            error!(?code, ?message, ?req, "http");
                            return Err(GrafanaError::Forbidden);
                        }
                        _ => {
                            let message = response.text().await.unwrap_or_default();
                            error!(?code, ?req, message, attempt, "http");
                            if attempt < MAX_RETRIES
                                && retry_for_status(code)
                                && is_idempotent_method(&req.method)
                            {
                                log_and_backoff(attempt, code.to_string()).await;
                                attempt += 1;
                                continue;
                            }
                            return Err(GrafanaError::ApiError {
                                code: code.as_u16(),
                                method: req.method.to_string(),
                                url: req.path,
                                message,
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(source=?e, ?req, "http");
                    if (e.is_connect() || e.is_timeout())
                        && is_idempotent_method(&req.method)
                        && attempt < MAX_RETRIES
                    {
                        log_and_backoff(attempt, e.to_string()).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(GrafanaError::Http {
                        method: req.method.to_string(),
                        url: req.path,
                        source: e,
                    });
                }
            }
        }
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
pub(crate) fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("Deserialization failed at {}: {}", err.path(), err);
            Err(GrafanaError::Deserialization {
                source: err.into_inner(),
            })
        }
    }
}

// log attempt and sleep for exponential backoff
async fn log_and_backoff(attempt: u32, err: String) {
    // exponential backoff: 1s, 2s, 4s, with jitter
    let base_delay = 2u64.pow(attempt);
    let jitter = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as f64
        / 1_000_000_000.0;
    let jittered_delay = ((base_delay as f64) * (0.5 + jitter)).round() as u64;
    let delay = if jittered_delay == 0 { 1 } else { jittered_delay };
    warn!("Recoverable error {err}. Attempt {attempt}. Waiting {delay}s before retry");
    tokio::time::sleep(Duration::from_secs(delay)).await;
}
