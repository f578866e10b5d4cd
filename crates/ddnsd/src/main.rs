// # ddnsd - DDNS Daemon
//
// Thin integration layer: all reconciliation logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Initializing logging
// 2. Loading and validating configuration
// 3. Building the HTTP IP source and the Gandi LiveDNS provider
// 4. Running the DDNS engine until SIGINT/SIGTERM
//
// ## Configuration
//
// Configuration is read from `config.yaml` in the working directory, or from
// the file named by `DDNS_CONFIG`. Every key can be overridden by an
// environment variable named after the key in upper case:
//
// - `IPPROVIDER`: URL answering with the bare public IP
// - `GANDI_API_ENDPOINT`: LiveDNS base URL
// - `GANDI_API_SECRET`: LiveDNS API key
// - `DOMAIN`, `SUBDOMAIN`: the record to maintain
// - `TTL`, `INTERVAL`: record TTL and seconds between cycles
// - `HTTP_TIMEOUT`, `ON_ERROR`, `MAX_RETRIES`, `RETRY_DELAY`, `DRY_RUN`
//
// `DDNS_MODE=dry-run` logs updates instead of writing them, and
// `DDNS_LOG_LEVEL` selects the log level (default `info`).
//
// ## Example
//
// ```bash
// export GANDI_API_SECRET=your_key
// export DDNS_CONFIG=/etc/ddns/config.yaml
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_gandi::GandiProvider;
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (including a fatal cycle under `on_error: exit`)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Map a `DDNS_LOG_LEVEL` value to a tracing level
fn parse_log_level(value: &str) -> Option<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let log_level = env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let Some(level) = parse_log_level(&log_level) else {
        eprintln!(
            "DDNS_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            log_level
        );
        return DdnsExitCode::ConfigError.into();
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match DdnsConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd daemon");
    info!("Managing record: {}", config.fqdn());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ip_source = HttpIpSource::from_config(&config).context("Failed to build IP source")?;
    let provider = GandiProvider::from_config(&config).context("Failed to build Gandi provider")?;

    info!("IP provider: {}", ip_source.url());
    info!("DNS provider: {:?}", provider);

    let (engine, event_rx) = DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)
        .context("Failed to create DDNS engine")?;

    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling error: {}", e),
        }
        signal_token.cancel();
    });

    let events = tokio::spawn(log_events(event_rx));

    let result = engine.run(shutdown).await;

    // Closing the sender lets the event logger drain and finish
    drop(engine);
    let _ = events.await;

    result.context("DDNS engine stopped")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Log engine events until the engine goes away
async fn log_events(mut event_rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
