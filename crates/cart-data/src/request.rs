//! HTTP request builder.

use std::collections::HashMap;
use std::time::Duration;

use crate::{FetchError, Response};

/// A GET request bound to a client, ready to send.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) http: reqwest::Client,
    pub(crate) url: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the Accept header.
    pub fn accept(self, content_type: impl Into<String>) -> Self {
        self.header("Accept", content_type)
    }

    /// The fully resolved URL this request targets.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the request and buffer the whole response.
    ///
    /// Non-2xx statuses are returned as a [`Response`]; use
    /// [`Response::error_for_status`] to turn them into errors.
    pub async fn send(self) -> Result<Response, FetchError> {
        let mut request = self.http.get(self.url.as_str());
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(url = %self.url, "GET");
        let response = request.send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(url = %self.url, status, bytes = body.len(), "response");
        Ok(Response::new(status, body))
    }
}
