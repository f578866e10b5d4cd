//! Configuration types for the DDNS reconciler
//!
//! The configuration is read once at startup from a YAML file (`config.yaml`
//! in the working directory, or the path in `DDNS_CONFIG`) and then
//! overridden key by key from the environment. The environment variable for
//! a key is the key upper-cased: `ipProvider` → `IPPROVIDER`,
//! `gandi_api_secret` → `GANDI_API_SECRET`, and so on.
//!
//! ```yaml
//! ipProvider: https://api.ipify.org
//! gandi_api_endpoint: https://api.gandi.net/v5/livedns
//! gandi_api_secret: xxxxxxxx
//! domain: example.com
//! subdomain: home
//! ttl: 300
//! interval: 600
//! ```
//!
//! After loading, the configuration is read-only and passed by value into
//! the components that need it.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the configuration file path
pub const CONFIG_PATH_ENV: &str = "DDNS_CONFIG";

/// Configuration file used when `DDNS_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default Gandi LiveDNS v5 base URL
pub const DEFAULT_GANDI_API_ENDPOINT: &str = "https://api.gandi.net/v5/livedns";

/// Smallest TTL accepted by LiveDNS
pub const MIN_TTL: u32 = 300;

/// Largest TTL accepted by LiveDNS (30 days)
pub const MAX_TTL: u32 = 2_592_000;

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// URL returning the caller's public IP as plain text
    #[serde(rename = "ipProvider", default)]
    pub ip_provider: String,

    /// Base URL of the registrar API
    #[serde(default = "default_api_endpoint")]
    pub gandi_api_endpoint: String,

    /// API key sent as `X-Api-Key`
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub gandi_api_secret: String,

    /// Registered domain name (e.g., "example.com")
    #[serde(default)]
    pub domain: String,

    /// Record name to maintain within the domain (e.g., "home", or "@" for the apex)
    #[serde(default)]
    pub subdomain: String,

    /// TTL in seconds written with the record
    #[serde(default = "default_ttl", deserialize_with = "lenient_u32")]
    pub ttl: u32,

    /// Seconds to sleep between reconciliation cycles
    #[serde(default = "default_interval", deserialize_with = "lenient_u64")]
    pub interval: u64,

    /// Engine and transport settings
    #[serde(flatten)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration for the given record with default settings
    ///
    /// The IP provider URL and API secret still have to be filled in before
    /// [`validate`](Self::validate) accepts it.
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            ip_provider: String::new(),
            gandi_api_endpoint: default_api_endpoint(),
            gandi_api_secret: String::new(),
            domain: domain.into(),
            subdomain: subdomain.into(),
            ttl: default_ttl(),
            interval: default_interval(),
            engine: EngineConfig::default(),
        }
    }

    /// Load, override from the process environment, and validate
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` as the environment
    ///
    /// A missing or unreadable configuration file is an error.
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_PATH_ENV).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut config = Self::from_file(&path)?;
        config.apply_env(&lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without applying overrides or validating
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a YAML document without applying overrides or validating
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(serde_yaml::from_str("{}")?);
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Override keys from the environment
    ///
    /// Numeric and boolean values that fail to parse are configuration errors.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("IPPROVIDER") {
            self.ip_provider = v;
        }
        if let Some(v) = lookup("GANDI_API_ENDPOINT") {
            self.gandi_api_endpoint = v;
        }
        if let Some(v) = lookup("GANDI_API_SECRET") {
            self.gandi_api_secret = v;
        }
        if let Some(v) = lookup("DOMAIN") {
            self.domain = v;
        }
        if let Some(v) = lookup("SUBDOMAIN") {
            self.subdomain = v;
        }
        if let Some(v) = lookup("TTL") {
            self.ttl = parse_env("TTL", &v)?;
        }
        if let Some(v) = lookup("INTERVAL") {
            self.interval = parse_env("INTERVAL", &v)?;
        }
        if let Some(v) = lookup("HTTP_TIMEOUT") {
            self.engine.http_timeout = parse_env("HTTP_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("ON_ERROR") {
            self.engine.on_error = parse_env("ON_ERROR", &v)?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            self.engine.max_retries = parse_env("MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("RETRY_DELAY") {
            self.engine.retry_delay = parse_env("RETRY_DELAY", &v)?;
        }
        if let Some(v) = lookup("DRY_RUN") {
            self.engine.dry_run = parse_bool("DRY_RUN", &v)?;
        }
        if lookup("DDNS_MODE").is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run")) {
            self.engine.dry_run = true;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_url("ipProvider", &self.ip_provider)?;
        validate_url("gandi_api_endpoint", &self.gandi_api_endpoint)?;

        if self.gandi_api_secret.trim().is_empty() {
            return Err(Error::config("gandi_api_secret is required"));
        }

        validate_domain_name(&self.domain)?;

        if self.subdomain != "@" {
            validate_domain_name(&self.subdomain)
                .map_err(|e| Error::config(format!("invalid subdomain: {}", e)))?;
        }

        if !(MIN_TTL..=MAX_TTL).contains(&self.ttl) {
            return Err(Error::config(format!(
                "ttl must be between {} and {} seconds. Got: {}",
                MIN_TTL, MAX_TTL, self.ttl
            )));
        }

        if self.interval == 0 {
            return Err(Error::config("interval must be > 0"));
        }

        self.engine.validate()
    }

    /// Sleep between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Fully qualified name of the managed record
    pub fn fqdn(&self) -> String {
        if self.subdomain == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.subdomain, self.domain)
        }
    }
}

// Custom Debug implementation that hides the API secret
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("ip_provider", &self.ip_provider)
            .field("gandi_api_endpoint", &self.gandi_api_endpoint)
            .field("gandi_api_secret", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("subdomain", &self.subdomain)
            .field("ttl", &self.ttl)
            .field("interval", &self.interval)
            .field("engine", &self.engine)
            .finish()
    }
}

/// What the engine does when a cycle fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log, retry with backoff, then wait for the next interval
    #[default]
    Retry,
    /// Stop the engine with the error
    Exit,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "exit" => Ok(Self::Exit),
            other => Err(Error::config(format!(
                "unknown failure policy '{}'. Valid: retry, exit",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout for every outbound HTTP request (in seconds)
    #[serde(default = "default_http_timeout", deserialize_with = "lenient_u64")]
    pub http_timeout: u64,

    /// Failure policy for a cycle
    #[serde(default)]
    pub on_error: FailurePolicy,

    /// Maximum number of retries of a failed cycle
    ///
    /// Only used with [`FailurePolicy::Retry`]. Set to 0 to skip straight
    /// to the next scheduled cycle.
    #[serde(default = "default_max_retries", deserialize_with = "lenient_usize")]
    pub max_retries: usize,

    /// Delay before the first retry (in seconds)
    ///
    /// Doubled after every failed attempt and capped at the cycle interval.
    #[serde(default = "default_retry_delay", deserialize_with = "lenient_u64")]
    pub retry_delay: u64,

    /// Read the record but only log the update instead of sending it
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<()> {
        if self.http_timeout == 0 {
            return Err(Error::config("http_timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }

    /// Per-request HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Delay before the first retry
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_http_timeout(),
            on_error: FailurePolicy::default(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_api_endpoint() -> String {
    DEFAULT_GANDI_API_ENDPOINT.to_string()
}

fn default_ttl() -> u32 {
    300
}

fn default_interval() -> u64 {
    300
}

fn default_http_timeout() -> u64 {
    5
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    100
}

/// YAML scalars may be written as `ttl: 300` or `ttl: "300"`
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_u64(deserializer)?;
    u32::try_from(value).map_err(serde::de::Error::custom)
}

fn lenient_usize<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_u64(deserializer)?;
    usize::try_from(value).map_err(serde::de::Error::custom)
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{} has an invalid value '{}': {}", key, value, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::config(format!(
            "{} must be a boolean. Got: {}",
            key, value
        ))),
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::config(format!("{} is required", key)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            key, url
        )));
    }
    Ok(())
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // RFC 1035: 253 chars max
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
