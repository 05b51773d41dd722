// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ensure_success(self, url: &str) -> Result<Self> {
        if !self.is_success() {
            return Err(anyhow::anyhow!(
                "HTTP request to {} failed with status: {}",
                url,
                self.status
            ));
        }
        Ok(self)
    }
}

/// The HTTP capability every network hop goes through.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> impl Future<Output = Result<FetchResponse>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .with_context(|| "Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", request.url))?;

        let status = response.status().as_u16();
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers
                    .entry(name.as_str().to_ascii_lowercase())
                    .or_default()
                    .push(value.to_string());
            }
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", request.url))?;

        debug!(
            "Fetched {} (status: {}, {} bytes)",
            request.url,
            status,
            body.len()
        );

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let request = FetchRequest::get("https://example.com").header("Referer", "https://a.test/");
        assert_eq!(request.header_value("referer"), Some("https://a.test/"));
        assert_eq!(request.header_value("Origin"), None);
    }

    #[test]
    fn test_ensure_success_rejects_error_status() {
        assert!(FetchResponse::new(200, "ok").ensure_success("u").is_ok());
        assert!(FetchResponse::new(404, "").ensure_success("u").is_err());
        assert!(FetchResponse::new(503, "").ensure_success("u").is_err());
    }

    #[test]
    fn test_response_headers_are_lowercased() {
        let response = FetchResponse::new(200, "")
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2");
        assert_eq!(response.header_values("SET-COOKIE"), ["a=1", "b=2"]);
        assert!(response.header_values("location").is_empty());
    }
}
