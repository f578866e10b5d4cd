//! Architectural Contract Test: Interval Scheduling
//!
//! This test verifies that cycles are spaced by exactly the configured
//! interval, and that nothing else drives the loop.
//!
//! Constraints verified:
//! - The first cycle runs immediately
//! - The sleep between completed cycles equals `interval`
//! - Only one cycle runs at a time
//!
//! If this test fails, someone has added:
//! - Jitter or drift compensation
//! - Extra polling or background refresh
//! - Concurrent cycles

mod common;

use common::*;
use ddns_core::config::FailurePolicy;
use ddns_core::{DdnsEngine, EngineEvent};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn cycles_are_spaced_by_interval() {
    // interval = 60s
    let ip_source = ScriptedIpSource::new(&["203.0.113.5"]);
    let provider = MockDnsProvider::new("203.0.113.5");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source.clone()),
        Box::new(provider.clone()),
        minimal_config(FailurePolicy::Retry),
    )
    .expect("engine construction succeeds");

    let started = tokio::time::Instant::now();
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let engine_handle = tokio::spawn(async move { engine.run(token).await });

    tokio::time::sleep(Duration::from_secs(3 * 60 + 1)).await;
    shutdown.cancel();
    engine_handle
        .await
        .expect("engine task does not panic")
        .expect("engine shuts down cleanly");

    let times = ip_source.call_times();
    assert_eq!(times.len(), 4, "Cycles at 0s, 60s, 120s and 180s");
    assert_eq!(times[0], started, "First cycle runs immediately");

    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(60));
    }

    assert_eq!(provider.zone_calls(), 4);
    assert_eq!(provider.update_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cycle_numbers_increase_by_one() {
    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::new(&["203.0.113.5"])),
        Box::new(MockDnsProvider::new("203.0.113.5")),
        minimal_config(FailurePolicy::Retry),
    )
    .expect("engine construction succeeds");

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let engine_handle = tokio::spawn(async move { engine.run(token).await });

    tokio::time::sleep(Duration::from_secs(2 * 60 + 1)).await;
    shutdown.cancel();
    engine_handle
        .await
        .expect("engine task does not panic")
        .expect("engine shuts down cleanly");

    let mut cycles = Vec::new();
    while let Some(event) = event_rx.recv().await {
        if let EngineEvent::CycleStarted { cycle } = event {
            cycles.push(cycle);
        }
    }

    assert_eq!(cycles, vec![1, 2, 3]);
}
