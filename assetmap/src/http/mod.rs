//! HTTP client abstraction for testability
//!
//! Every network collaborator (GIS map services, the asset-management API)
//! goes through [`AsyncHttpClient`], so tests can substitute a mock and the
//! timeout policy lives in one place.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Default per-request timeout. A timed-out call is treated like any other
/// failed call by the resolution layers.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from HTTP operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    /// Request could not be sent or the response body not read.
    #[error("request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

impl HttpError {
    /// Whether this error is an authentication/authorization rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HttpError::Status { status: 401 | 403, .. })
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Request(_) => None,
        }
    }
}

/// Trait for async HTTP GET operations.
///
/// This abstraction allows dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body as bytes.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Real HTTP client implementation using reqwest.
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom per-request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        tracing::trace!(url, "HTTP GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Request(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Request(format!("failed to read response: {}", e)))
    }
}
