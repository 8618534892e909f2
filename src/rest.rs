//! Shared HTTP client for the hosted REST backend.
//!
//! Every request carries the project `apikey` header; authenticated calls add
//! a bearer token on top. Status handling stays with the callers.

use std::time::Duration;

use reqwest::RequestBuilder;

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
#[error("HTTP client build failed: {0}")]
pub struct ClientBuildError(String);

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    /// Build a client for `base_url` (trailing `/` is ignored).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, anon_key: String, timeout: Duration) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), anon_key })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header("apikey", &self.anon_key)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .header("apikey", &self.anon_key)
    }
}
