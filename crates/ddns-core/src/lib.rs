// # ddns-core
//
// Core library for the DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one DNS "A"
// record pointed at the caller's public IP:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for reading and writing the record via a registrar API
// - **DdnsEngine**: Reconciliation loop (resolve → compare → update → sleep)
// - **DdnsConfig**: Configuration loaded from YAML and the environment
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Stateless Cycles**: Every cycle re-derives its state from live queries
// 3. **Engine-Owned Policy**: Retries, backoff and scheduling live in the engine only
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, CycleOutcome};
pub use config::{DdnsConfig, EngineConfig, FailurePolicy};
pub use error::{Error, Result};
