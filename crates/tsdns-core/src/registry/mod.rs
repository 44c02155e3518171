//! Plugin-based provider registry
//!
//! The registry allows DNS providers and peer sources to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tsdns_core::registry::ProviderRegistry;
//! use tsdns_core::config::ProviderConfig;
//!
//! // Create a registry (the in-memory provider is pre-registered)
//! let registry = ProviderRegistry::new();
//!
//! // Register providers
//! tsdns_provider_cloudflare::register(&registry);
//!
//! // Create provider from config
//! let config = ProviderConfig::Cloudflare { ... };
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::{PeerSourceConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::provider::MemoryProviderFactory;
use crate::traits::{DnsProvider, DnsProviderFactory, PeerSource, PeerSourceFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Provider registry for plugin-based provider and peer source creation
///
/// The registry maintains a map of type names to factory objects,
/// allowing dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,

    /// Registered peer source factories
    peer_sources: RwLock<HashMap<String, Box<dyn PeerSourceFactory>>>,
}

impl ProviderRegistry {
    /// Create a registry with the built-in `memory` provider registered
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_provider("memory", Box::new(MemoryProviderFactory));
        registry
    }

    /// Create a registry with nothing registered
    pub fn empty() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            peer_sources: RwLock::new(HashMap::new()),
        }
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let name = name.into();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name, factory);
    }

    /// Register a peer source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Peer source type name (e.g., "tailscale", "file")
    /// - `factory`: Factory object for creating peer source instances
    pub fn register_peer_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn PeerSourceFactory>,
    ) {
        let name = name.into();
        let mut sources = self
            .peer_sources
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sources.insert(name, factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a peer source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn PeerSource>)`: Created peer source instance
    /// - `Err(Error)`: If source type is not registered or creation fails
    pub fn create_peer_source(&self, config: &PeerSourceConfig) -> Result<Box<dyn PeerSource>> {
        config.validate()?;

        let source_type = config.type_name();
        let sources = self
            .peer_sources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown peer source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all registered peer source types
    pub fn list_peer_sources(&self) -> Vec<String> {
        let sources = self
            .peer_sources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }

    /// Check if a peer source type is registered
    pub fn has_peer_source(&self, name: &str) -> bool {
        let sources = self
            .peer_sources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sources.contains_key(name)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
