// # IP Source Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP "what is my IP" service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// An IP source answers one question per call: what is the caller's public
/// address right now. It is queried once per reconciliation cycle by
/// [`DdnsEngine`](crate::DdnsEngine).
///
/// The address is returned as an opaque string. The engine compares it
/// byte-for-byte against the DNS record and writes it verbatim, so
/// implementations must strip transport noise (trailing newlines) but must
/// not otherwise normalize it.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one outbound request per call
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic (owned by `DdnsEngine`)
/// - ❌ Cache the address between calls (every cycle re-derives it)
/// - ❌ Spawn polling loops (scheduling is owned by `DdnsEngine`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The current address, never empty, never containing newlines
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
