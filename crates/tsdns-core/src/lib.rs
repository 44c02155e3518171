// # tsdns-core
//
// Core library for publishing tailnet peers as provider-hosted DNS records.
//
// ## Architecture Overview
//
// This library provides the reconciliation logic and its seams:
// - **PeerSource**: Trait for reading the tailnet roster once per run
// - **DnsProvider**: Trait for listing and changing records via provider APIs
// - **ZoneDescriptor**: Managed suffix and record naming
// - **roster**: Sanitization, tag filtering and alias expansion
// - **SyncEngine**: One pass of roster -> desired records -> reconcile
// - **ProviderRegistry**: Plugin-based registry for providers and peer sources
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation is independent of any DNS vendor
// 2. **Single Pass**: Records are listed once; changes are applied sequentially
// 3. **Fail Fast**: The first provider failure stops the run, nothing is rolled back
// 4. **Scoped Deletes**: Only records under the managed suffix are ever deleted
// 5. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod provider;
pub mod roster;
pub mod zone;

// Re-export core types for convenience
pub use traits::{DnsProvider, PeerSource};
pub use engine::{Action, RunError, RunReport, SyncEngine};
pub use registry::ProviderRegistry;
pub use config::{PeerSourceConfig, ProviderConfig, ReconcileMode, SyncConfig};
pub use error::{Error, ReconcileError, Result};
pub use provider::MemoryProvider;
pub use zone::{RecordType, ZoneDescriptor};
