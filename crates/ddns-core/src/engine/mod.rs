//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the current public IP via IpSource
//! - Reading the DNS-recorded IP via DnsProvider
//! - Updating the record when the two diverge
//! - Sleeping between cycles until cancelled
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────┐
//!                       │  DdnsEngine  │
//!                       └──────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//! ┌─────────────┐      ┌──────────────┐      ┌─────────────┐
//! │  IpSource   │      │ DnsProvider  │      │   Events    │
//! │ (current)   │      │ (zone/read/  │      │  (notify)   │
//! └─────────────┘      │  update)     │      └─────────────┘
//!                      └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the current public IP
//! 2. Resolve the zone id of the configured domain
//! 3. Read the DNS-recorded IP of the configured subdomain
//! 4. If the two differ (byte-for-byte), write the current IP with the configured TTL
//! 5. Sleep for the configured interval, then repeat
//!
//! A failure at any step aborts the cycle; no further calls are made in it.
//! What happens next is decided by the configured [`FailurePolicy`].

use crate::config::{DdnsConfig, FailurePolicy};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, RecordUpdate};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        record_name: String,
    },

    /// A reconciliation cycle began
    CycleStarted {
        cycle: u64,
    },

    /// DNS update skipped (record already matches)
    UpdateSkipped {
        record_name: String,
        current_ip: String,
    },

    /// DNS update succeeded
    UpdateSucceeded {
        record_name: String,
        previous_ip: String,
        new_ip: String,
    },

    /// A cycle failed after all retries
    CycleFailed {
        cycle: u64,
        error: String,
        retry_count: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of one successful reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// DNS already pointed at the current IP
    Unchanged {
        ip: String,
    },
    /// DNS was rewritten
    Updated {
        previous_ip: String,
        new_ip: String,
    },
}

/// Core DDNS engine
///
/// The engine runs one reconciliation cycle at a time on the calling task.
/// Exactly one cycle's network calls are in flight at any moment, and the
/// next cycle starts only after the full interval has elapsed following the
/// previous cycle's completion or failure.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs until the cancellation token fires (or, under
///    [`FailurePolicy::Exit`], until a cycle fails)
pub struct DdnsEngine {
    /// IP source for the current public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for the zone and record
    provider: Box<dyn DnsProvider>,

    /// Registered domain name
    domain: String,

    /// Record name within the domain
    subdomain: String,

    /// TTL written with every update
    ttl: u32,

    /// Sleep between cycles
    interval: Duration,

    /// What to do when a cycle fails
    on_error: FailurePolicy,

    /// Maximum retries of a failed cycle
    max_retries: usize,

    /// Delay before the first retry
    retry_delay: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            interval: config.interval(),
            retry_delay: config.engine.retry_delay(),
            domain: config.domain,
            subdomain: config.subdomain,
            ttl: config.ttl,
            on_error: config.engine.on_error,
            max_retries: config.engine.max_retries,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the reconciliation loop
    ///
    /// Cancelling `shutdown` interrupts the sleep, or an in-flight cycle,
    /// promptly.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: A cycle failed under [`FailurePolicy::Exit`]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            record_name: self.record_name(),
        });
        info!(
            "Reconciling {} via {} every {}s",
            self.record_name(),
            self.provider.provider_name(),
            self.interval.as_secs()
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            self.emit_event(EngineEvent::CycleStarted { cycle });

            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.run_cycle_with_retry(cycle) => result,
            };

            if let Err(e) = result {
                match self.on_error {
                    FailurePolicy::Exit => {
                        error!("Cycle {} failed, stopping: {}", cycle, e);
                        self.emit_event(EngineEvent::Stopped {
                            reason: format!("Cycle failed: {}", e),
                        });
                        return Err(e);
                    }
                    FailurePolicy::Retry => {
                        error!("Cycle {} failed, waiting for next interval: {}", cycle, e);
                    }
                }
            }

            info!("Sleeping for {}s", self.interval.as_secs());
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run a single reconciliation cycle
    ///
    /// Resolves the current IP, the zone id and the DNS-recorded IP in that
    /// order, then writes the record if the two addresses differ. The first
    /// failing step aborts the cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let current_ip = self.ip_source.current().await?;
        if current_ip.is_empty() {
            return Err(Error::ip_source(format!(
                "{} returned an empty address",
                self.ip_source.source_name()
            )));
        }
        debug!("Current IP: {}", current_ip);

        let zone_id = self.provider.zone_id(&self.domain).await?;
        debug!("Zone ID for {}: {}", self.domain, zone_id);

        let dns_ip = self.provider.read_record(&zone_id, &self.subdomain).await?;
        debug!("IP in DNS: {}", dns_ip);

        if current_ip == dns_ip {
            info!("Current IP is correct, no need to update: {}", current_ip);
            self.emit_event(EngineEvent::UpdateSkipped {
                record_name: self.record_name(),
                current_ip: current_ip.clone(),
            });
            return Ok(CycleOutcome::Unchanged { ip: current_ip });
        }

        info!("IP has changed!");
        info!("Current IP: {}", current_ip);
        info!("IP in DNS: {}", dns_ip);
        info!("Updating {} with IP {}", self.record_name(), current_ip);

        let update = RecordUpdate::a(self.subdomain.as_str(), self.ttl, current_ip.as_str());
        self.provider.update_record(&zone_id, &update).await?;

        self.emit_event(EngineEvent::UpdateSucceeded {
            record_name: self.record_name(),
            previous_ip: dns_ip.clone(),
            new_ip: current_ip.clone(),
        });

        Ok(CycleOutcome::Updated {
            previous_ip: dns_ip,
            new_ip: current_ip,
        })
    }

    /// Run a cycle, retrying a failed one according to the failure policy
    ///
    /// Under [`FailurePolicy::Exit`] there are no retries.
    async fn run_cycle_with_retry(&self, cycle: u64) -> Result<CycleOutcome> {
        let max_retries = match self.on_error {
            FailurePolicy::Retry => self.max_retries,
            FailurePolicy::Exit => 0,
        };

        let mut delay = self.retry_delay.min(self.interval);
        let mut attempt = 0;
        loop {
            match self.run_cycle().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < max_retries => {
                    attempt += 1;
                    warn!(
                        "Cycle {} attempt {} failed: {}. Retrying in {}s",
                        cycle,
                        attempt,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_retry_delay(delay, self.interval);
                }
                Err(e) => {
                    self.emit_event(EngineEvent::CycleFailed {
                        cycle,
                        error: e.to_string(),
                        retry_count: attempt,
                    });
                    return Err(e);
                }
            }
        }
    }

    /// Fully qualified name of the managed record
    fn record_name(&self) -> String {
        if self.subdomain == "@" {
            self.domain.clone()
        } else {
            format!("{}.{}", self.subdomain, self.domain)
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Nobody listening is fine; a full channel means the consumer is behind
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Double the retry delay, never exceeding `cap`
fn next_retry_delay(delay: Duration, cap: Duration) -> Duration {
    delay.saturating_mul(2).min(cap)
}
