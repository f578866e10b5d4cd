// # Gandi LiveDNS Provider
//
// This crate provides a Gandi LiveDNS (API v5) provider for the DDNS reconciler.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retry, no backoff, no caching
//   (all owned by DdnsEngine)
// - HTTP timeout configured from `http_timeout`
// - Missing response fields are reported as `Error::FieldNotFound`, never
//   silently defaulted
// - A rejected update is reported as `Error::WriteRejected`
// - Dry-run mode: GETs are performed, the PUT is only logged
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Provider MUST fail fast if the key is empty
//
// ## API Reference
//
// - Get domain: GET `/domains/:fqdn` → `{ "zone_uuid": ..., ... }`
// - Get record: GET `/zones/:zone_uuid/records/:name/A` → `{ "rrset_values": [...], ... }`
// - Replace record: PUT `/zones/:zone_uuid/records/:name/A`
//
// All requests carry the key in the `X-Api-Key` header.

use async_trait::async_trait;
use ddns_core::config::DdnsConfig;
use ddns_core::traits::{DnsProvider, DnsRecord, RECORD_TYPE_A, RecordUpdate};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-Api-Key";

/// Error bodies longer than this are truncated before being reported
const MAX_ERROR_BODY_LEN: usize = 512;

/// Response of GET /domains/:fqdn (only the field we use)
#[derive(Debug, Deserialize)]
struct DomainResponse {
    zone_uuid: Option<String>,
}

/// Response of GET /zones/:zone_uuid/records/:name/:type
#[derive(Debug, Deserialize)]
struct RrsetResponse {
    rrset_name: Option<String>,
    rrset_type: Option<String>,
    rrset_ttl: Option<u32>,
    rrset_values: Option<Vec<String>>,
}

/// Body of PUT /zones/:zone_uuid/records/:name/:type
#[derive(Debug, Serialize)]
struct RrsetUpdate<'a> {
    rrset_ttl: u32,
    rrset_name: &'a str,
    rrset_values: &'a [String],
}

/// Gandi LiveDNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. All coordination
/// (retries, backoff, scheduling) is owned by `DdnsEngine`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct GandiProvider {
    /// Base URL, without trailing slash
    api_endpoint: String,

    /// Gandi API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiProvider")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiProvider {
    /// Create a new Gandi provider
    ///
    /// # Parameters
    ///
    /// - `api_endpoint`: LiveDNS base URL (e.g., "https://api.gandi.net/v5/livedns")
    /// - `api_key`: API key with LiveDNS permissions
    /// - `timeout`: Timeout applied to every request
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(
        api_endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_endpoint: String = api_endpoint.into();
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
            dry_run,
        })
    }

    /// Create from the `gandi_api_*`, `http_timeout` and `dry_run` configuration keys
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.engine.dry_run {
            tracing::warn!("Gandi provider running in DRY-RUN mode - no changes will be made");
        }

        Self::new(
            config.gandi_api_endpoint.clone(),
            config.gandi_api_secret.clone(),
            config.engine.http_timeout(),
            config.engine.dry_run,
        )
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn record_url(&self, zone_id: &str, record_name: &str) -> String {
        format!(
            "{}/zones/{}/records/{}/{}",
            self.api_endpoint, zone_id, record_name, RECORD_TYPE_A
        )
    }

    /// GET `url` and decode the JSON body
    ///
    /// Transport failures map to `Error::Transport`, non-2xx statuses to a
    /// status error, and undecodable bodies to `Error::Json`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a non-success status to an error
fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            "gandi",
            format!(
                "Authentication failed: Invalid API key or insufficient permissions. Status: {}",
                status
            ),
        ),
        429 => Error::provider(
            "gandi",
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        code => Error::http(code, truncate(body)),
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl DnsProvider for GandiProvider {
    /// # API Call
    ///
    /// ```http
    /// GET /domains/example.com
    /// X-Api-Key: <key>
    /// ```
    async fn zone_id(&self, domain: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let url = format!("{}/domains/{}", self.api_endpoint, domain);
        let response: DomainResponse = self.get_json(&url).await?;

        match response.zone_uuid {
            Some(zone_id) if !zone_id.is_empty() => {
                tracing::debug!("Found zone ID: {}", zone_id);
                Ok(zone_id)
            }
            _ => Err(Error::field_not_found("zone_uuid")),
        }
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_uuid/records/home/A
    /// X-Api-Key: <key>
    /// ```
    async fn get_record(&self, zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        tracing::debug!("Looking up record: {} (type: {})", record_name, RECORD_TYPE_A);

        let url = self.record_url(zone_id, record_name);
        let response: RrsetResponse = self.get_json(&url).await?;

        Ok(DnsRecord {
            name: response
                .rrset_name
                .unwrap_or_else(|| record_name.to_string()),
            record_type: response
                .rrset_type
                .unwrap_or_else(|| RECORD_TYPE_A.to_string()),
            ttl: response.rrset_ttl,
            values: response.rrset_values.unwrap_or_default(),
        })
    }

    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_uuid/records/home/A
    /// X-Api-Key: <key>
    /// Content-Type: application/json
    ///
    /// {"rrset_ttl": 300, "rrset_name": "home", "rrset_values": ["198.51.100.9"]}
    /// ```
    async fn update_record(&self, zone_id: &str, record: &RecordUpdate) -> Result<()> {
        let url = self.record_url(zone_id, &record.name);
        let payload = RrsetUpdate {
            rrset_ttl: record.ttl,
            rrset_name: &record.name,
            rrset_values: &record.values,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        tracing::info!("Update response: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::write_rejected(status.as_u16(), truncate(&body)));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "gandi"
    }
}
