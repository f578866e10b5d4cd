// # DNS Provider Trait
//
// Defines the interface for reading and writing a DNS "A" record through a
// registrar API.
//
// ## Implementations
//
// - Gandi LiveDNS: `ddns-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::traits::RecordUpdate;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.zone_id("example.com").await?;
//     let dns_ip = provider.read_record(&zone_id, "home").await?;
//
//     provider
//         .update_record(&zone_id, &RecordUpdate::a("home", 300, "198.51.100.9"))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Record type managed by the reconciler
pub const RECORD_TYPE_A: &str = "A";

/// A DNS record set as held by the registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record name within the zone (e.g., "home")
    pub name: String,
    /// The record type (always "A" here)
    pub record_type: String,
    /// Time-to-live, if the registrar reported one
    pub ttl: Option<u32>,
    /// Record values, in registrar order
    pub values: Vec<String>,
}

impl DnsRecord {
    /// The first value of the record set
    ///
    /// Only the first value is ever compared or rewritten; any further
    /// values of a multi-value record are ignored.
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Desired state for a record, handed to [`DnsProvider::update_record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// The record name within the zone
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Values to store; replaces the whole record set
    pub values: Vec<String>,
}

impl RecordUpdate {
    /// A single-value "A" record update
    pub fn a(name: impl Into<String>, ttl: u32, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl,
            values: vec![ip.into()],
        }
    }
}

/// Trait for DNS provider implementations
///
/// The three operations map one-to-one onto registrar API calls. Each call
/// issues exactly one request and reports failure as an error; whether to
/// retry, and whether an update is needed at all, is decided by
/// [`DdnsEngine`](crate::DdnsEngine).
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Cache zone ids or records between calls
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a domain name to the registrar's zone identifier
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone identifier, never empty
    /// - `Err(Error::FieldNotFound)`: The response carried no identifier
    /// - `Err(Error)`: Transport or status failure
    async fn zone_id(&self, domain: &str) -> Result<String, crate::Error>;

    /// Fetch the "A" record `record_name` within `zone_id`
    async fn get_record(&self, zone_id: &str, record_name: &str)
    -> Result<DnsRecord, crate::Error>;

    /// Overwrite the "A" record described by `record` within `zone_id`
    ///
    /// # Idempotency
    ///
    /// Writing the same values twice leaves the registrar in the same state.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The registrar accepted the update
    /// - `Err(Error::WriteRejected)`: The registrar answered with a non-success status
    /// - `Err(Error)`: Transport failure
    async fn update_record(&self, zone_id: &str, record: &RecordUpdate)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Fetch the current value of the "A" record
    ///
    /// Returns the first value of the record set.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The first value, never empty
    /// - `Err(Error::FieldNotFound)`: The record set has no (non-empty) value
    async fn read_record(&self, zone_id: &str, record_name: &str) -> Result<String, crate::Error> {
        let record = self.get_record(zone_id, record_name).await?;

        match record.first_value() {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(crate::Error::field_not_found("rrset_values")),
        }
    }
}
