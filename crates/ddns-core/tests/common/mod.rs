//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that record every call the
//! engine makes, so tests can assert on call order, call counts and timing
//! without any network access.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, FailurePolicy};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// An IpSource that answers from a script
///
/// Each call pops the next address; the last one is repeated once the
/// script is exhausted. Clones share the script and the call log.
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<String>>>,
    last: Arc<Mutex<String>>,
    fail: bool,
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedIpSource {
    /// Answer with `ips` in order
    pub fn new(ips: &[&str]) -> Self {
        Self {
            script: Arc::new(Mutex::new(ips.iter().map(|ip| ip.to_string()).collect())),
            last: Arc::new(Mutex::new(String::new())),
            fail: false,
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every call with a transport error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }

    /// Get the (tokio) instants at which current() was called
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_times.lock().unwrap().push(Instant::now());

        if self.fail {
            return Err(Error::transport("connection refused"));
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// An IpSource whose call never completes (for cancellation testing)
pub struct HangingIpSource;

#[async_trait::async_trait]
impl IpSource for HangingIpSource {
    async fn current(&self) -> Result<String> {
        std::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }

    fn source_name(&self) -> &'static str {
        "hanging"
    }
}

/// Which provider call a [`MockDnsProvider`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Zone,
    Read,
    Update,
}

struct ProviderState {
    zone_id: String,
    record_value: Mutex<String>,
    fail_at: Mutex<Option<FailAt>>,
    failures_remaining: AtomicUsize,
    zone_calls: AtomicUsize,
    read_calls: AtomicUsize,
    update_calls: AtomicUsize,
    updates: Mutex<Vec<(String, RecordUpdate)>>,
}

/// A mock DnsProvider backed by one in-memory record
///
/// Updates are applied to the record, so a second cycle sees the written
/// value. Clones share state and counters.
#[derive(Clone)]
pub struct MockDnsProvider {
    state: Arc<ProviderState>,
}

impl MockDnsProvider {
    /// A provider whose record currently holds `record_value`
    pub fn new(record_value: &str) -> Self {
        Self {
            state: Arc::new(ProviderState {
                zone_id: "zone-uuid-1".to_string(),
                record_value: Mutex::new(record_value.to_string()),
                fail_at: Mutex::new(None),
                failures_remaining: AtomicUsize::new(0),
                zone_calls: AtomicUsize::new(0),
                read_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
                updates: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fail the next `times` calls at `step` with a transport error
    pub fn fail_at(self, step: FailAt, times: usize) -> Self {
        *self.state.fail_at.lock().unwrap() = Some(step);
        self.state.failures_remaining.store(times, Ordering::SeqCst);
        self
    }

    /// Get the number of times zone_id() was called
    pub fn zone_calls(&self) -> usize {
        self.state.zone_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times get_record() was called
    pub fn read_calls(&self) -> usize {
        self.state.read_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_calls(&self) -> usize {
        self.state.update_calls.load(Ordering::SeqCst)
    }

    /// Get the (zone_id, update) pairs that were written
    pub fn updates(&self) -> Vec<(String, RecordUpdate)> {
        self.state.updates.lock().unwrap().clone()
    }

    /// The record value as it stands now
    pub fn record_value(&self) -> String {
        self.state.record_value.lock().unwrap().clone()
    }

    fn maybe_fail(&self, step: FailAt) -> Result<()> {
        if *self.state.fail_at.lock().unwrap() != Some(step) {
            return Ok(());
        }

        let remaining = self.state.failures_remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        self.state
            .failures_remaining
            .store(remaining - 1, Ordering::SeqCst);

        match step {
            FailAt::Update => Err(Error::write_rejected(500, "internal error")),
            _ => Err(Error::transport("connection refused")),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn zone_id(&self, _domain: &str) -> Result<String> {
        self.state.zone_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail(FailAt::Zone)?;
        Ok(self.state.zone_id.clone())
    }

    async fn get_record(&self, _zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        self.state.read_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail(FailAt::Read)?;

        let value = self.record_value();
        Ok(DnsRecord {
            name: record_name.to_string(),
            record_type: "A".to_string(),
            ttl: Some(300),
            values: if value.is_empty() { Vec::new() } else { vec![value] },
        })
    }

    async fn update_record(&self, zone_id: &str, record: &RecordUpdate) -> Result<()> {
        self.state.update_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail(FailAt::Update)?;

        self.state
            .updates
            .lock()
            .unwrap()
            .push((zone_id.to_string(), record.clone()));
        if let Some(first) = record.values.first() {
            *self.state.record_value.lock().unwrap() = first.clone();
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal valid DdnsConfig for testing
pub fn minimal_config(on_error: FailurePolicy) -> DdnsConfig {
    let mut config = DdnsConfig::new("example.com", "home");
    config.ip_provider = "http://ip.test".to_string();
    config.gandi_api_secret = "test-key".to_string();
    config.ttl = 600;
    config.interval = 60;
    config.engine.on_error = on_error;
    config.engine.max_retries = 2;
    config.engine.retry_delay = 1;
    config
}
