//! Architectural Contract Test: Shutdown Determinism
//!
//! This test verifies that shutdown is prompt and complete.
//!
//! Constraints verified:
//! - Cancelling the token interrupts the sleep between cycles
//! - Cancelling the token interrupts an in-flight cycle
//! - A cancelled engine performs no further calls
//! - The engine reports why it stopped
//!
//! If this test fails, someone has added:
//! - Uninterruptible sleeps
//! - Tasks that ignore cancellation
//! - Blocking operations in the shutdown path

mod common;

use common::*;
use ddns_core::config::FailurePolicy;
use ddns_core::{DdnsEngine, EngineEvent};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn shutdown_interrupts_sleep() {
    let mut config = minimal_config(FailurePolicy::Retry);
    config.interval = 3600;

    let ip_source = ScriptedIpSource::new(&["203.0.113.5"]);
    let provider = MockDnsProvider::new("203.0.113.5");

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ip_source.clone()),
        Box::new(provider),
        config,
    )
    .expect("engine construction succeeds");

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let engine_handle = tokio::spawn(async move { engine.run(token).await });

    // Wait for the first cycle to finish; the engine is now sleeping
    loop {
        if let EngineEvent::UpdateSkipped { .. } = event_rx.recv().await.expect("engine is running")
        {
            break;
        }
    }

    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), engine_handle).await;
    assert!(
        result.is_ok(),
        "Engine should stop well before the hour-long interval elapses"
    );

    let engine_result = result.unwrap().unwrap();
    assert!(
        engine_result.is_ok(),
        "Engine should shut down successfully: {:?}",
        engine_result
    );
    assert_eq!(ip_source.call_count(), 1);

    let mut stopped = false;
    while let Some(event) = event_rx.recv().await {
        if let EngineEvent::Stopped { reason } = event {
            assert_eq!(reason, "Shutdown signal");
            stopped = true;
        }
    }
    assert!(stopped, "Engine should emit Stopped on shutdown");
}

#[tokio::test]
async fn shutdown_interrupts_in_flight_cycle() {
    let provider = MockDnsProvider::new("203.0.113.5");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(HangingIpSource),
        Box::new(provider.clone()),
        minimal_config(FailurePolicy::Retry),
    )
    .expect("engine construction succeeds");

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let engine_handle = tokio::spawn(async move { engine.run(token).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), engine_handle).await;
    assert!(result.is_ok(), "A hanging request must not block shutdown");
    assert!(result.unwrap().unwrap().is_ok());
    assert_eq!(provider.zone_calls(), 0);
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let ip_source = ScriptedIpSource::new(&["203.0.113.5"]);

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source.clone()),
        Box::new(MockDnsProvider::new("203.0.113.5")),
        minimal_config(FailurePolicy::Retry),
    )
    .expect("engine construction succeeds");

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let result = engine.run(shutdown).await;

    assert!(result.is_ok());
    assert_eq!(ip_source.call_count(), 0);
}

#[tokio::test]
async fn engine_stops_without_event_consumer() {
    // A dropped receiver must not stall or fail the engine
    let (engine, event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::new(&["198.51.100.9"])),
        Box::new(MockDnsProvider::new("198.51.100.1")),
        minimal_config(FailurePolicy::Retry),
    )
    .expect("engine construction succeeds");
    drop(event_rx);

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let engine_handle = tokio::spawn(async move { engine.run(token).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), engine_handle).await;
    assert!(result.is_ok());
    assert!(result.unwrap().unwrap().is_ok());
}
