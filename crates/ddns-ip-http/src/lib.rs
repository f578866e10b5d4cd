// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS reconciler.
//
// ## Architecture
//
// Fetches the current public IP from an external "what is my IP" service
// (e.g., api.ipify.org, icanhazip.com) that answers a plain GET with the bare
// address as the whole `text/plain` body. One request per call; scheduling
// and retries are owned by `DdnsEngine`.

use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::time::Duration;

/// HTTP-based IP source
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org")
    /// - `timeout`: Timeout applied to the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the `ipProvider` and `http_timeout` configuration keys
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(config.ip_provider.clone(), config.engine.http_timeout())
    }

    /// The URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| Error::transport(format!("IP lookup request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::http(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let ip = strip_newlines(&body);
        if ip.is_empty() {
            return Err(Error::ip_source(format!(
                "{} returned an empty body",
                self.url
            )));
        }

        tracing::debug!("Public IP from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Remove every line break from a response body
fn strip_newlines(body: &str) -> String {
    body.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}
