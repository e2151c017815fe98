//! HTTP client utilities for the cart's product and stock lookups.
//!
//! Provides a small, ergonomic API over `reqwest` for JSON GET requests
//! against a fixed API base URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use cart_data::FetchClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Stock {
//!     id: u64,
//!     amount: i64,
//! }
//!
//! let client = FetchClient::new()
//!     .with_base_url("http://localhost:3333")
//!     .with_timeout(std::time::Duration::from_secs(5));
//!
//! let stock: Stock = client
//!     .get("/stock/1")
//!     .send()
//!     .await?
//!     .error_for_status()?
//!     .json()?;
//! ```

mod error;
mod request;
mod response;

use std::collections::HashMap;
use std::time::Duration;

pub use error::FetchError;
pub use request::RequestBuilder;
pub use response::Response;

/// HTTP client for outbound JSON lookups.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create a client over a preconfigured `reqwest::Client`.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: None,
            default_headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Create a client with a base URL that will be prepended to relative paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Bound every request to `timeout`. Without one, requests wait indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            http: self.http.clone(),
            url: self.resolve(url.into()),
            headers: self.default_headers.clone(),
            timeout: self.timeout,
        }
    }

    fn resolve(&self, url: String) -> String {
        match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
            _ => url,
        }
    }
}
